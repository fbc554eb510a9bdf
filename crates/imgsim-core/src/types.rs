//! Domain types shared by the locator, the ingestion pipeline and the search engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub type ModelKey = String;

/// Identity of one discovered source image.
///
/// - `root_relative_path`: path segments below the asset root, unique per scan
/// - `folder`: directory portion joined with `/`, empty for root-level files
/// - `base_name`: file name without extension
/// - `extension`: lowercase extension from the allow-list
/// - `display_name`: `folder/base_name`, or just `base_name` at the root
/// - `public_path`: URL-safe relative path (only the base name is slugified)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub root_relative_path: Vec<String>,
    pub folder: String,
    pub base_name: String,
    pub extension: String,
    pub display_name: String,
    pub public_path: String,
}

impl AssetDescriptor {
    /// `/`-joined relative path, as stored in `EmbeddingRecord::original_path`.
    pub fn relative_path(&self) -> String {
        self.root_relative_path.join("/")
    }

    pub fn absolute_path(&self, root: &Path) -> PathBuf {
        self.root_relative_path.iter().fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }
}

/// One stored vector plus its provenance.
///
/// `features` is optional on the read side only: a record loaded from disk
/// whose `features` are absent or not a list of numbers deserializes with
/// `None` and ranks with similarity 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingRecord {
    pub id: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub original_path: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, deserialize_with = "lenient_features")]
    pub features: Option<Vec<f64>>,
    #[serde(default)]
    pub model_used: ModelKey,
}

impl EmbeddingRecord {
    pub fn from_descriptor(desc: &AssetDescriptor, public_prefix: &str, features: Vec<f64>, model_key: &str) -> Self {
        Self {
            id: desc.base_name.clone(),
            folder: desc.folder.clone(),
            display_name: desc.display_name.clone(),
            original_path: desc.relative_path(),
            image_url: join_url(public_prefix, &desc.public_path),
            features: Some(features),
            model_used: model_key.to_string(),
        }
    }
}

fn join_url(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("/{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

fn lenient_features<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else { return Ok(None) };
    Ok(items.iter().map(serde_json::Value::as_f64).collect::<Option<Vec<f64>>>())
}

/// The full set of records for one model key, in store order.
pub type EmbeddingStore = Vec<EmbeddingRecord>;

/// Registry row describing the store for one model key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub name: String,
    pub filename: String,
    pub last_updated: DateTime<Utc>,
}

/// Manifest keyed by model key; ordered so rewrites are byte-stable.
pub type Registry = BTreeMap<ModelKey, RegistryEntry>;

/// A record extended with its cosine similarity to the query, in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    #[serde(flatten)]
    pub record: EmbeddingRecord,
    pub similarity: f64,
}

/// Aggregate outcome of one ingestion run.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub store: EmbeddingStore,
    pub store_path: PathBuf,
    pub succeeded: usize,
    pub failed: usize,
    /// `(original_path, error text)` for every skipped asset.
    pub failures: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_features_deserialize_as_none() {
        let json = r#"[
            {"id":"a","features":[1.0,2.0]},
            {"id":"b","features":"oops"},
            {"id":"c","features":[1.0,null]},
            {"id":"d"}
        ]"#;
        let store: EmbeddingStore = serde_json::from_str(json).unwrap();
        assert_eq!(store[0].features, Some(vec![1.0, 2.0]));
        assert!(store[1].features.is_none());
        assert!(store[2].features.is_none());
        assert!(store[3].features.is_none());
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let desc = AssetDescriptor {
            root_relative_path: vec!["tiles".into(), "Red Tile.jpg".into()],
            folder: "tiles".into(),
            base_name: "Red Tile".into(),
            extension: "jpg".into(),
            display_name: "tiles/Red Tile".into(),
            public_path: "tiles/red-tile.jpg".into(),
        };
        let rec = EmbeddingRecord::from_descriptor(&desc, "/assets/", vec![0.5], "m");
        assert_eq!(rec.image_url, "/assets/tiles/red-tile.jpg");
        assert_eq!(rec.original_path, "tiles/Red Tile.jpg");
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["displayName"], "tiles/Red Tile");
        assert_eq!(v["modelUsed"], "m");
        assert!(v.get("display_name").is_none());
    }
}
