//! Decoding and resizing shared by the adapters.

use candle_core::{DType, Device, Tensor};
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use imgsim_core::EmbedError;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, EmbedError> {
    if bytes.is_empty() {
        return Err(EmbedError::ImageDecode("empty input".to_string()));
    }
    image::load_from_memory(bytes).map_err(|e| EmbedError::ImageDecode(e.to_string()))
}

/// Decode and resize to exactly `size`x`size` RGB with bilinear filtering.
pub fn decode_rgb(bytes: &[u8], size: u32) -> Result<RgbImage, EmbedError> {
    Ok(decode(bytes)?.resize_exact(size, size, FilterType::Triangle).to_rgb8())
}

/// `[3, size, size]` float tensor, scaled to `[0, 1]` and ImageNet-normalized.
pub fn image_tensor(bytes: &[u8], size: u32, device: &Device) -> Result<Tensor, EmbedError> {
    let rgb = decode_rgb(bytes, size)?;
    let side = size as usize;
    let build = || -> candle_core::Result<Tensor> {
        let raw = Tensor::from_vec(rgb.into_raw(), (side, side, 3), &Device::Cpu)?
            .permute((2, 0, 1))?
            .to_dtype(DType::F32)?;
        let scaled = (raw / 255.0)?;
        let mean = Tensor::new(&IMAGENET_MEAN, &Device::Cpu)?.reshape((3, 1, 1))?;
        let std = Tensor::new(&IMAGENET_STD, &Device::Cpu)?.reshape((3, 1, 1))?;
        scaled.broadcast_sub(&mean)?.broadcast_div(&std)?.to_device(device)
    };
    build().map_err(|e| EmbedError::Inference(format!("tensor conversion failed: {e}")))
}

/// L2-normalize in place; fails on an all-zero vector.
pub fn l2_normalize(v: &mut [f64]) -> Result<(), EmbedError> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Err(EmbedError::Inference("zero-norm embedding".to_string()));
    }
    for x in v.iter_mut() { *x /= norm; }
    Ok(())
}
