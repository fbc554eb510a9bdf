use imgsim_core::{EmbedError, ImageEmbedder};

use crate::preprocess::decode_rgb;

const THUMB: u32 = 64;

/// Joint RGB color histogram with `bins` levels per channel (`bins^3` values),
/// normalized to sum to 1.
pub struct HistogramEmbedder {
    key: String,
    bins: usize,
}

impl HistogramEmbedder {
    pub fn new(key: &str, bins: usize) -> Self { Self { key: key.to_string(), bins: bins.clamp(1, 16) } }

    fn bucket(&self, channel: u8) -> usize { usize::from(channel) * self.bins / 256 }
}

impl ImageEmbedder for HistogramEmbedder {
    fn model_key(&self) -> &str { &self.key }
    fn dim(&self) -> usize { self.bins * self.bins * self.bins }

    fn embed(&self, image_bytes: &[u8]) -> Result<Vec<f64>, EmbedError> {
        let rgb = decode_rgb(image_bytes, THUMB)?;
        let mut hist = vec![0f64; self.dim()];
        for px in rgb.pixels() {
            let [r, g, b] = px.0;
            let idx = (self.bucket(r) * self.bins + self.bucket(g)) * self.bins + self.bucket(b);
            hist[idx] += 1.0;
        }
        let total = f64::from(THUMB * THUMB);
        for h in &mut hist { *h /= total; }
        Ok(hist)
    }
}
