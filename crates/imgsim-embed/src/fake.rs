use std::hash::Hasher;
use twox_hash::XxHash64;

use imgsim_core::{EmbedError, ImageEmbedder};

use crate::preprocess::{decode, l2_normalize};

/// Deterministic stand-in for a real model: decodes the image, then hashes
/// each pixel row into one of `dim` buckets. Same pixels, same vector.
pub struct FakeEmbedder {
    key: String,
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(key: &str, dim: usize) -> Self { Self { key: key.to_string(), dim: dim.max(1) } }
}

impl ImageEmbedder for FakeEmbedder {
    fn model_key(&self) -> &str { &self.key }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, image_bytes: &[u8]) -> Result<Vec<f64>, EmbedError> {
        let rgb = decode(image_bytes)?.to_rgb8();
        let mut v = vec![0f64; self.dim];
        for (i, row) in rgb.rows().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write_usize(i);
            for px in row { hasher.write(&px.0); }
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = f64::from((h >> 32) as u32) / f64::from(u32::MAX);
            v[idx] += val + 0.01;
        }
        l2_normalize(&mut v)?;
        Ok(v)
    }
}
