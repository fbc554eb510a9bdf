//! Batch ingestion: locate assets, embed each one, write the store, update the registry.
//!
//! Per-asset failures (unreadable file, undecodable image, inference error,
//! timeout) are logged, counted and skipped. Unknown model keys, a missing
//! asset root and model load failures abort before anything is written.

use chrono::Utc;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use imgsim_core::config::{resolve_with_base, Settings};
use imgsim_core::locator::AssetLocator;
use imgsim_core::traits::embed_checked;
use imgsim_core::types::{AssetDescriptor, BuildSummary, EmbeddingRecord, RegistryEntry};
use imgsim_core::{Error, ImageEmbedder, Result};
use imgsim_embed::ModelCatalog;

use crate::invoke::run_blocking;
use crate::{registry, store};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub data_dir: PathBuf,
    pub registry_file: String,
    pub public_prefix: String,
    pub workers: usize,
    pub embed_timeout: Option<Duration>,
    pub show_progress: bool,
}

impl PipelineOptions {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            registry_file: "embeddings_manifest.json".to_string(),
            public_prefix: "/assets".to_string(),
            workers: 1,
            embed_timeout: None,
            show_progress: false,
        }
    }

    pub fn from_settings(settings: &Settings, base: &Path) -> Self {
        let timeout = settings.ingest.embed_timeout_secs;
        Self {
            data_dir: resolve_with_base(base, &settings.paths.data_dir),
            registry_file: settings.paths.registry_file.clone(),
            public_prefix: settings.paths.public_prefix.clone(),
            workers: settings.ingest.workers.max(1),
            embed_timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
            show_progress: true,
        }
    }

    pub fn registry_path(&self) -> PathBuf { self.data_dir.join(&self.registry_file) }
}

pub struct IngestionPipeline {
    catalog: ModelCatalog,
    options: PipelineOptions,
    locator: AssetLocator,
    key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    registry_lock: tokio::sync::Mutex<()>,
}

impl IngestionPipeline {
    pub fn new(catalog: ModelCatalog, options: PipelineOptions) -> Self {
        Self {
            catalog,
            options,
            locator: AssetLocator::new(),
            key_locks: Mutex::new(HashMap::new()),
            registry_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn key_lock(&self, model_key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(model_key.to_string()).or_default().clone()
    }

    /// Regenerate the store for `model_key` from every image under `root`.
    ///
    /// Builds for the same key are serialized; different keys may run concurrently.
    pub async fn build(&self, root: &Path, model_key: &str) -> Result<BuildSummary> {
        let spec = self.catalog.get(model_key)?.clone();
        if !root.is_dir() {
            return Err(Error::AssetRootMissing(root.to_path_buf()));
        }

        let lock = self.key_lock(model_key);
        let _guard = lock.lock().await;

        info!("building '{}' embeddings ({}) from {}", model_key, spec.name, root.display());
        let adapter = self.load_adapter(model_key).await?;
        let assets = self.locator.locate(root)?;
        info!("found {} images to process", assets.len());

        let outcomes = self.embed_all(root, &assets, adapter).await;

        let mut records = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (desc, outcome) in assets.iter().zip(outcomes) {
            match outcome {
                Ok(features) => records.push(EmbeddingRecord::from_descriptor(desc, &self.options.public_prefix, features, model_key)),
                Err(e) => {
                    warn!("skipping {}: {}", desc.relative_path(), e);
                    failures.push((desc.relative_path(), e.to_string()));
                }
            }
        }

        let store_path = self.options.data_dir.join(&spec.filename);
        store::write_store(&store_path, &records)?;
        info!("saved embeddings for {} images to {}", records.len(), store_path.display());
        if !failures.is_empty() {
            warn!("failed to process {} images", failures.len());
        }

        {
            let _registry_guard = self.registry_lock.lock().await;
            let entry = RegistryEntry { name: spec.name.clone(), filename: spec.filename.clone(), last_updated: Utc::now() };
            registry::upsert(&self.options.registry_path(), model_key, entry)?;
        }

        Ok(BuildSummary { succeeded: records.len(), failed: failures.len(), store: records, store_path, failures })
    }

    async fn load_adapter(&self, model_key: &str) -> Result<Arc<dyn ImageEmbedder>> {
        let catalog = self.catalog.clone();
        let key = model_key.to_string();
        tokio::task::spawn_blocking(move || catalog.load_adapter(&key))
            .await
            .map_err(|e| Error::ModelLoadFailure { key: model_key.to_string(), reason: e.to_string() })?
    }

    /// One outcome per descriptor, in descriptor order regardless of worker count.
    async fn embed_all(&self, root: &Path, assets: &[AssetDescriptor], adapter: Arc<dyn ImageEmbedder>) -> Vec<Result<Vec<f64>>> {
        let pb = self.progress_bar(assets.len());
        let timeout = self.options.embed_timeout;
        let jobs = assets.iter().enumerate().map(|(i, desc)| {
            let adapter = Arc::clone(&adapter);
            let path = desc.absolute_path(root);
            async move {
                debug!("processing {}", path.display());
                let outcome = run_blocking(timeout, move || {
                    let bytes = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
                    embed_checked(adapter.as_ref(), &bytes).map_err(Error::from)
                })
                .await;
                (i, outcome)
            }
        });
        let mut outcomes: Vec<(usize, Result<Vec<f64>>)> = futures::stream::iter(jobs)
            .buffer_unordered(self.options.workers.max(1))
            .inspect(|_| pb.inc(1))
            .collect()
            .await;
        pb.finish_and_clear();
        outcomes.sort_by_key(|(i, _)| *i);
        outcomes.into_iter().map(|(_, o)| o).collect()
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images ({percent}%)")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
