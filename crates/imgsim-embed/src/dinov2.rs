//! DINOv2 ViT-S/14 run on candle from local safetensors weights.

use candle_core::{DType, Device};
use candle_nn::{Module, VarBuilder};
use candle_transformers::models::dinov2::{self, DinoVisionTransformer};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use imgsim_core::{EmbedError, Error, ImageEmbedder, Result};

use crate::device::select_device;
use crate::preprocess::image_tensor;

pub const DINOV2_INPUT: u32 = 224;
pub const DINOV2_DIM: usize = 1000;

pub struct Dinov2Embedder {
    key: String,
    model: DinoVisionTransformer,
    device: Device,
}

impl Dinov2Embedder {
    pub fn load(key: &str, weights: &Path) -> Result<Self> {
        let fail = |reason: String| Error::ModelLoadFailure { key: key.to_string(), reason };
        if !weights.is_file() {
            return Err(fail(format!("weights not found at {}", weights.display())));
        }
        let device = select_device();
        info!("loading DINOv2 weights from {}", weights.display());
        // SAFETY: the weights file is mapped read-only and not modified while the model lives.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device) }
            .map_err(|e| fail(e.to_string()))?;
        let model = dinov2::vit_small(vb).map_err(|e| fail(e.to_string()))?;
        info!("DINOv2 model loaded");
        Ok(Self { key: key.to_string(), model, device })
    }
}

impl ImageEmbedder for Dinov2Embedder {
    fn model_key(&self) -> &str { &self.key }
    fn dim(&self) -> usize { DINOV2_DIM }

    fn embed(&self, image_bytes: &[u8]) -> std::result::Result<Vec<f64>, EmbedError> {
        let start = Instant::now();
        let input = image_tensor(image_bytes, DINOV2_INPUT, &self.device)?;
        let out = input
            .unsqueeze(0)
            .and_then(|x| self.model.forward(&x))
            .and_then(|logits| logits.squeeze(0))
            .and_then(|logits| logits.to_device(&Device::Cpu))
            .and_then(|logits| logits.to_vec1::<f32>())
            .map_err(|e| EmbedError::Inference(e.to_string()))?;
        debug!("dinov2 forward took {:?}", start.elapsed());
        Ok(out.into_iter().map(f64::from).collect())
    }
}
