//! Query-time session: resolve a model key's store through the registry,
//! embed the submitted image with a cached adapter and rank.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use imgsim_core::config::{resolve_with_base, Settings};
use imgsim_core::traits::embed_checked;
use imgsim_core::types::{EmbeddingStore, Registry, SimilarityResult};
use imgsim_core::{Error, ImageEmbedder, Result};
use imgsim_embed::ModelCatalog;

use crate::invoke::run_blocking;
use crate::search::rank;
use crate::{registry, store};

/// Adapters are loaded on first use per key and kept until the session drops.
pub struct QuerySession {
    catalog: ModelCatalog,
    data_dir: PathBuf,
    registry_file: String,
    timeout: Option<Duration>,
    adapters: tokio::sync::Mutex<HashMap<String, Arc<dyn ImageEmbedder>>>,
}

impl QuerySession {
    pub fn new(catalog: ModelCatalog, data_dir: &Path) -> Self {
        Self {
            catalog,
            data_dir: data_dir.to_path_buf(),
            registry_file: "embeddings_manifest.json".to_string(),
            timeout: None,
            adapters: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(catalog: ModelCatalog, settings: &Settings, base: &Path) -> Self {
        let secs = settings.ingest.embed_timeout_secs;
        let mut session = Self::new(catalog, &resolve_with_base(base, &settings.paths.data_dir));
        session.registry_file = settings.paths.registry_file.clone();
        session.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        session
    }

    pub fn with_data_dir(mut self, data_dir: &Path) -> Self {
        self.data_dir = data_dir.to_path_buf();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry_path(&self) -> PathBuf { self.data_dir.join(&self.registry_file) }

    /// Which model keys currently have stores.
    pub fn available_stores(&self) -> Result<Registry> { registry::read(&self.registry_path()) }

    pub fn load_store(&self, model_key: &str) -> Result<EmbeddingStore> {
        let registry = self.available_stores()?;
        let entry = registry.get(model_key).ok_or_else(|| Error::StoreNotFound(model_key.to_string()))?;
        let store = store::read_store(model_key, &self.data_dir.join(&entry.filename))?;
        debug!("loaded {} records for '{}'", store.len(), model_key);
        Ok(store)
    }

    async fn adapter(&self, model_key: &str) -> Result<Arc<dyn ImageEmbedder>> {
        let mut adapters = self.adapters.lock().await;
        if let Some(a) = adapters.get(model_key) {
            return Ok(Arc::clone(a));
        }
        let catalog = self.catalog.clone();
        let key = model_key.to_string();
        let adapter = tokio::task::spawn_blocking(move || catalog.load_adapter(&key))
            .await
            .map_err(|e| Error::ModelLoadFailure { key: model_key.to_string(), reason: e.to_string() })??;
        adapters.insert(model_key.to_string(), Arc::clone(&adapter));
        Ok(adapter)
    }

    /// Embed `image_bytes` with `model_key`'s adapter and return the `top_k` closest records.
    pub async fn query(&self, image_bytes: Vec<u8>, model_key: &str, top_k: usize) -> Result<Vec<SimilarityResult>> {
        self.catalog.get(model_key)?;
        let store = self.load_store(model_key)?;
        let adapter = self.adapter(model_key).await?;
        let query = run_blocking(self.timeout, move || embed_checked(adapter.as_ref(), &image_bytes).map_err(Error::from)).await?;
        let results = rank(&query, &store, top_k);
        info!("'{}': {} of {} records returned", model_key, results.len(), store.len());
        Ok(results)
    }

    /// Rank a precomputed query vector against `model_key`'s store.
    pub fn query_vector(&self, query: &[f64], model_key: &str, top_k: usize) -> Result<Vec<SimilarityResult>> {
        let store = self.load_store(model_key)?;
        Ok(rank(query, &store, top_k))
    }
}
