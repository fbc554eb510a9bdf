//! Recursive discovery of eligible image files under an asset root.

use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::slug::slugify;
use crate::types::AssetDescriptor;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

#[derive(Debug, Clone)]
pub struct AssetLocator {
    allowed: Vec<String>,
}

impl Default for AssetLocator {
    fn default() -> Self {
        Self { allowed: IMAGE_EXTENSIONS.iter().map(|s| (*s).to_string()).collect() }
    }
}

impl AssetLocator {
    pub fn new() -> Self { Self::default() }

    /// Enumerate every allow-listed image below `root`, sorted by relative path.
    ///
    /// A missing `root` is an error; unreadable entries inside the tree are skipped.
    pub fn locate(&self, root: &Path) -> Result<Vec<AssetDescriptor>> {
        if !root.is_dir() {
            return Err(Error::AssetRootMissing(root.to_path_buf()));
        }
        let mut out = Vec::new();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => { debug!("skipping unreadable entry: {err}"); None }
        }) {
            if !entry.file_type().is_file() { continue; }
            if let Some(desc) = self.describe(root, entry.path()) { out.push(desc); }
        }
        out.sort_by(|a, b| a.root_relative_path.cmp(&b.root_relative_path));
        debug!("located {} assets under {}", out.len(), root.display());
        Ok(out)
    }

    /// Build the descriptor for one file, or `None` if it is not an eligible image.
    pub fn describe(&self, root: &Path, path: &Path) -> Option<AssetDescriptor> {
        let raw_ext = path.extension()?.to_str()?;
        let extension = raw_ext.to_lowercase();
        if !self.allowed.iter().any(|a| *a == extension) { return None; }
        let base_name = path.file_stem()?.to_string_lossy().to_string();

        let relative = path.strip_prefix(root).ok()?;
        let segments: Vec<String> = relative.components().map(|c| c.as_os_str().to_string_lossy().to_string()).collect();
        let folder = segments[..segments.len().saturating_sub(1)].join("/");

        let display_name = if folder.is_empty() { base_name.clone() } else { format!("{folder}/{base_name}") };
        let safe_file = format!("{}.{}", slugify(&base_name), raw_ext);
        let public_path = if folder.is_empty() { safe_file } else { format!("{folder}/{safe_file}") };

        Some(AssetDescriptor { root_relative_path: segments, folder, base_name, extension, display_name, public_path })
    }
}
