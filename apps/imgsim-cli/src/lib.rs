//! Shared plumbing for the imgsim binaries.

use std::path::PathBuf;

use imgsim_core::config::{resolve_with_base, Config, Settings};
use imgsim_core::types::SimilarityResult;
use imgsim_embed::ModelCatalog;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

pub struct App {
    pub settings: Settings,
    pub base: PathBuf,
    pub catalog: ModelCatalog,
}

impl App {
    pub fn load() -> anyhow::Result<Self> {
        let config = Config::load()?;
        let settings = config.settings()?;
        let base = std::env::current_dir()?;
        let catalog = ModelCatalog::builtin(&resolve_with_base(&base, &settings.models.weights_dir));
        Ok(Self { settings, base, catalog })
    }

    pub fn resolve(&self, p: &str) -> PathBuf { resolve_with_base(&self.base, p) }

    pub fn model_key<'a>(&'a self, arg: Option<&'a str>) -> &'a str {
        arg.unwrap_or(self.settings.models.default.as_str())
    }

    pub fn available_models(&self) -> String { self.catalog.keys().join(", ") }
}

/// One result line: rank, display name, score as a percentage, URL.
pub fn format_hit(rank: usize, hit: &SimilarityResult) -> String {
    format!(
        "{:>3}. {:<40} {:>5.1}% match  {}",
        rank,
        hit.record.display_name,
        hit.similarity * 100.0,
        hit.record.image_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgsim_core::types::EmbeddingRecord;

    #[test]
    fn hit_line_shows_percent_with_one_decimal() {
        let hit = SimilarityResult {
            record: EmbeddingRecord {
                id: "red".into(),
                folder: "tiles".into(),
                display_name: "tiles/red".into(),
                original_path: "tiles/red.jpg".into(),
                image_url: "/assets/tiles/red.jpg".into(),
                features: None,
                model_used: "m".into(),
            },
            similarity: 0.875,
        };
        let line = format_hit(1, &hit);
        assert!(line.contains("87.5% match"), "{line}");
        assert!(line.contains("tiles/red"));
        assert!(line.ends_with("/assets/tiles/red.jpg"));
    }
}
