//! Manifest of which model keys have stores and when each was last built.
//!
//! Updates are read-modify-write on the whole file followed by an atomic
//! replace. A missing file is an empty registry; a corrupt one is logged and
//! treated as empty, and the next successful upsert repairs it.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

use imgsim_core::types::{Registry, RegistryEntry};
use imgsim_core::{Error, Result};

use crate::store::write_atomic;

/// Strict read: `RegistryCorrupt` when the file does not parse.
pub fn try_read(path: &Path) -> Result<Registry> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Registry::new()),
        Err(e) => return Err(Error::io(path, e)),
    };
    serde_json::from_slice(&bytes).map_err(|e| Error::RegistryCorrupt { path: path.to_path_buf(), reason: e.to_string() })
}

/// Registry contents, recovering from corruption with an empty registry.
pub fn read(path: &Path) -> Result<Registry> {
    match try_read(path) {
        Err(e @ Error::RegistryCorrupt { .. }) => {
            warn!("{e}; treating registry as empty");
            Ok(Registry::new())
        }
        other => other,
    }
}

/// Set `registry[model_key] = entry`, leaving other keys untouched.
pub fn upsert(path: &Path, model_key: &str, entry: RegistryEntry) -> Result<Registry> {
    let mut registry = read(path)?;
    info!("registry: {} -> {} ({})", model_key, entry.filename, entry.last_updated.to_rfc3339());
    registry.insert(model_key.to_string(), entry);
    let bytes = serde_json::to_vec_pretty(&registry)?;
    write_atomic(path, &bytes)?;
    Ok(registry)
}
