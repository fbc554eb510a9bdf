//! Embedding adapters and the model catalog that selects them by key.
//!
//! Respects `APP_USE_FAKE_EMBEDDINGS=1` to swap built-in backends for the
//! FakeEmbedder (same dimension) for fast, deterministic runs without weights.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use imgsim_core::{Error, ImageEmbedder, Result};

pub mod device;
pub mod dinov2;
pub mod fake;
pub mod histogram;
pub mod preprocess;

pub use fake::FakeEmbedder;
pub use histogram::HistogramEmbedder;

pub type AdapterLoader = Arc<dyn Fn(&ModelSpec) -> Result<Arc<dyn ImageEmbedder>> + Send + Sync>;

/// How a model key's vectors are produced.
#[derive(Clone)]
pub enum Backend {
    /// DINOv2 ViT-S/14; weights read from `<weights_dir>/<file>`.
    Dinov2 { weights_file: String },
    Histogram { bins: usize },
    Fake { dim: usize },
    /// Caller-supplied adapter, e.g. a remote model or a test double.
    Custom { dim: usize, loader: AdapterLoader },
}

impl Backend {
    pub fn dim(&self) -> usize {
        match self {
            Self::Dinov2 { .. } => dinov2::DINOV2_DIM,
            Self::Histogram { bins } => bins * bins * bins,
            Self::Fake { dim } | Self::Custom { dim, .. } => *dim,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dinov2 { weights_file } => f.debug_struct("Dinov2").field("weights_file", weights_file).finish(),
            Self::Histogram { bins } => f.debug_struct("Histogram").field("bins", bins).finish(),
            Self::Fake { dim } => f.debug_struct("Fake").field("dim", dim).finish(),
            Self::Custom { dim, .. } => f.debug_struct("Custom").field("dim", dim).finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub key: String,
    pub name: String,
    /// Store filename inside the data directory.
    pub filename: String,
    pub backend: Backend,
}

impl ModelSpec {
    pub fn new(key: &str, name: &str, backend: Backend) -> Self {
        Self { key: key.to_string(), name: name.to_string(), filename: format!("{key}_embeddings.json"), backend }
    }

    pub fn dim(&self) -> usize { self.backend.dim() }
}

/// Registered model keys. Owned by whoever orchestrates a session; there is
/// no process-wide instance.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    specs: BTreeMap<String, ModelSpec>,
    weights_dir: PathBuf,
    force_fake: bool,
}

impl ModelCatalog {
    /// Empty catalog, for callers that register only their own adapters.
    pub fn empty(weights_dir: &Path) -> Self {
        Self { specs: BTreeMap::new(), weights_dir: weights_dir.to_path_buf(), force_fake: use_fake_embeddings() }
    }

    pub fn builtin(weights_dir: &Path) -> Self {
        let mut catalog = Self::empty(weights_dir);
        catalog.register(ModelSpec::new("dinov2", "DINOv2 ViT-S/14", Backend::Dinov2 { weights_file: "dinov2_vits14.safetensors".to_string() }));
        catalog.register(ModelSpec::new("histogram", "RGB Color Histogram", Backend::Histogram { bins: 4 }));
        catalog.register(ModelSpec::new("fake", "Deterministic Fake", Backend::Fake { dim: 1024 }));
        catalog
    }

    /// Add or replace the entry for `spec.key`.
    pub fn register(&mut self, spec: ModelSpec) -> &mut Self {
        self.specs.insert(spec.key.clone(), spec);
        self
    }

    pub fn with_fake_override(mut self, force_fake: bool) -> Self {
        self.force_fake = force_fake;
        self
    }

    pub fn get(&self, key: &str) -> Result<&ModelSpec> {
        self.specs.get(key).ok_or_else(|| Error::UnknownModel(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool { self.specs.contains_key(key) }

    pub fn specs(&self) -> impl Iterator<Item = &ModelSpec> { self.specs.values() }

    pub fn keys(&self) -> Vec<String> { self.specs.keys().cloned().collect() }

    /// Initialize the adapter for `key`.
    ///
    /// `UnknownModel` for unregistered keys, `ModelLoadFailure` when the
    /// backend cannot start.
    pub fn load_adapter(&self, key: &str) -> Result<Arc<dyn ImageEmbedder>> {
        let spec = self.get(key)?;
        if self.force_fake && !matches!(spec.backend, Backend::Custom { .. }) {
            info!("using FakeEmbedder for '{}'", key);
            return Ok(Arc::new(FakeEmbedder::new(key, spec.dim())));
        }
        let adapter: Arc<dyn ImageEmbedder> = match &spec.backend {
            Backend::Dinov2 { weights_file } => Arc::new(dinov2::Dinov2Embedder::load(key, &self.weights_dir.join(weights_file))?),
            Backend::Histogram { bins } => Arc::new(HistogramEmbedder::new(key, *bins)),
            Backend::Fake { dim } => Arc::new(FakeEmbedder::new(key, *dim)),
            Backend::Custom { loader, .. } => loader(spec)?,
        };
        info!("{} ({}) ready, dim={}", spec.name, key, adapter.dim());
        Ok(adapter)
    }
}

fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}
