//! Embedding store files: one JSON array of records per model key, replaced
//! atomically as a whole.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use imgsim_core::types::{EmbeddingRecord, EmbeddingStore};
use imgsim_core::{Error, Result};

/// Write `bytes` to a temp file next to `path`, fsync, then rename over `path`.
/// Readers see either the old file or the new one, never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

pub fn write_store(path: &Path, records: &[EmbeddingRecord]) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(records)?;
    write_atomic(path, &bytes)?;
    debug!("wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Load the store for `model_key` from `path`; a missing file is `StoreNotFound`.
pub fn read_store(model_key: &str, path: &Path) -> Result<EmbeddingStore> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::StoreNotFound(model_key.to_string())),
        Err(e) => return Err(Error::io(path, e)),
    };
    Ok(serde_json::from_slice(&bytes)?)
}
