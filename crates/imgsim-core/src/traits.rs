use crate::error::EmbedError;

/// Image in, fixed-length vector out.
///
/// Implementations must return vectors of exactly `dim()` values for every
/// successful call and release any per-call buffers before returning, on
/// success and on error alike.
pub trait ImageEmbedder: Send + Sync {
    /// Model key whose vector space this adapter produces.
    fn model_key(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed(&self, image_bytes: &[u8]) -> Result<Vec<f64>, EmbedError>;
}

/// Embed and enforce the output contract: exactly `dim()` finite values.
pub fn embed_checked(embedder: &dyn ImageEmbedder, image_bytes: &[u8]) -> Result<Vec<f64>, EmbedError> {
    let v = embedder.embed(image_bytes)?;
    if v.len() != embedder.dim() {
        return Err(EmbedError::Inference(format!(
            "{} returned {} values, expected {}",
            embedder.model_key(),
            v.len(),
            embedder.dim()
        )));
    }
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        return Err(EmbedError::Inference(format!("non-finite value at index {pos}")));
    }
    Ok(v)
}
