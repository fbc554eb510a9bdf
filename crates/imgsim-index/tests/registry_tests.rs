use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use imgsim_core::types::{EmbeddingRecord, RegistryEntry};
use imgsim_core::{EmbedError, Error, ImageEmbedder};
use imgsim_embed::{Backend, ModelCatalog, ModelSpec};
use imgsim_index::{registry, store, QuerySession};
use tempfile::TempDir;

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn entry(name: &str, key: &str, at: &str) -> RegistryEntry {
    RegistryEntry { name: name.to_string(), filename: format!("{key}_embeddings.json"), last_updated: ts(at) }
}

#[test]
fn upsert_two_keys_keeps_both() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("embeddings_manifest.json");
    let a = entry("Model A", "a", "2024-01-01T00:00:00Z");
    let b = entry("Model B", "b", "2024-02-02T00:00:00Z");

    registry::upsert(&path, "a", a.clone()).unwrap();
    registry::upsert(&path, "b", b.clone()).unwrap();

    let reg = registry::read(&path).unwrap();
    assert_eq!(reg.len(), 2);
    assert_eq!(reg["a"], a);
    assert_eq!(reg["b"], b);

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["a"]["filename"], "a_embeddings.json");
    assert_eq!(raw["b"]["lastUpdated"], "2024-02-02T00:00:00Z");
}

#[test]
fn upsert_overwrites_only_its_key() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("m.json");
    registry::upsert(&path, "a", entry("A", "a", "2024-01-01T00:00:00Z")).unwrap();
    registry::upsert(&path, "b", entry("B", "b", "2024-01-01T00:00:00Z")).unwrap();
    let newer = entry("A2", "a", "2025-01-01T00:00:00Z");
    registry::upsert(&path, "a", newer.clone()).unwrap();
    let reg = registry::read(&path).unwrap();
    assert_eq!(reg["a"], newer);
    assert_eq!(reg["b"].name, "B");
}

#[test]
fn missing_registry_is_empty() {
    let tmp = TempDir::new().unwrap();
    assert!(registry::read(&tmp.path().join("none.json")).unwrap().is_empty());
}

#[test]
fn corrupt_registry_recovers_and_is_repaired() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("embeddings_manifest.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(registry::try_read(&path), Err(Error::RegistryCorrupt { .. })));
    assert!(registry::read(&path).unwrap().is_empty());

    registry::upsert(&path, "k", entry("K", "k", "2024-03-03T00:00:00Z")).unwrap();
    let reg = registry::try_read(&path).expect("repaired");
    assert_eq!(reg.len(), 1);
}

#[test]
fn missing_store_file_is_store_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = store::read_store("m", &tmp.path().join("m_embeddings.json")).unwrap_err();
    assert!(matches!(err, Error::StoreNotFound(k) if k == "m"));
}

#[test]
fn atomic_write_replaces_whole_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested/dir/out.json");
    store::write_atomic(&path, b"[1,2,3]").unwrap();
    store::write_atomic(&path, b"[]").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
    assert_eq!(leftovers.len(), 1, "no temp files left behind");
}

#[test]
fn stored_features_read_back_bit_exact() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("m_embeddings.json");
    let features = vec![0.20137023097791806, 0.09361661846377223, -0.1 - 0.2, 1e-300, 5e-324, f64::MAX];
    let records = vec![EmbeddingRecord {
        id: "red".into(),
        folder: "tiles".into(),
        display_name: "tiles/red".into(),
        original_path: "tiles/red.jpg".into(),
        image_url: "/assets/tiles/red.jpg".into(),
        features: Some(features.clone()),
        model_used: "m".into(),
    }];
    store::write_store(&path, &records).unwrap();
    let stored = store::read_store("m", &path).unwrap();
    assert_eq!(stored, records);
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(stored[0].features.as_deref().unwrap()), bits(&features));
}

fn catalog() -> ModelCatalog {
    let mut catalog = ModelCatalog::empty(Path::new("models")).with_fake_override(false);
    catalog.register(ModelSpec::new("m", "Tiny", Backend::Fake { dim: 2 }));
    catalog
}

#[tokio::test]
async fn query_errors_are_surfaced() {
    let tmp = TempDir::new().unwrap();
    let session = QuerySession::new(catalog(), tmp.path());

    let err = session.query(vec![1, 2, 3], "zzz", 3).await.unwrap_err();
    assert!(matches!(err, Error::UnknownModel(_)));

    let err = session.query(vec![1, 2, 3], "m", 3).await.unwrap_err();
    assert!(matches!(err, Error::StoreNotFound(_)), "no registry entry yet");

    registry::upsert(&session.registry_path(), "m", entry("Tiny", "m", "2024-01-01T00:00:00Z")).unwrap();
    let err = session.query(vec![1, 2, 3], "m", 3).await.unwrap_err();
    assert!(matches!(err, Error::StoreNotFound(_)), "registry entry but no file");

    store::write_store(&tmp.path().join("m_embeddings.json"), &[]).unwrap();
    let err = session.query(b"garbage".to_vec(), "m", 3).await.unwrap_err();
    assert!(matches!(err, Error::ImageDecodeFailure(_)));

    assert_eq!(session.available_stores().unwrap().len(), 1);
}

#[test]
fn malformed_records_rank_last_with_zero() {
    let tmp = TempDir::new().unwrap();
    let session = QuerySession::new(catalog(), tmp.path());
    registry::upsert(&session.registry_path(), "m", entry("Tiny", "m", "2024-01-01T00:00:00Z")).unwrap();
    let json = r#"[
        {"id":"bad","folder":"","displayName":"bad","originalPath":"bad.png","imageUrl":"/assets/bad.png","features":"nope","modelUsed":"m"},
        {"id":"wrong-len","features":[1.0,0.0,0.0],"modelUsed":"m"},
        {"id":"good","features":[0.6,0.8],"modelUsed":"m"}
    ]"#;
    fs::write(tmp.path().join("m_embeddings.json"), json).unwrap();

    let hits = session.query_vector(&[0.6, 0.8], "m", 10).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.record.id.as_str()).collect();
    assert_eq!(ids, vec!["good", "bad", "wrong-len"]);
    assert_eq!(hits[1].similarity, 0.0);
    assert_eq!(hits[2].similarity, 0.0);
}

struct HangingEmbedder;

impl ImageEmbedder for HangingEmbedder {
    fn model_key(&self) -> &str { "hang" }
    fn dim(&self) -> usize { 2 }
    fn embed(&self, _image_bytes: &[u8]) -> Result<Vec<f64>, EmbedError> {
        std::thread::sleep(Duration::from_millis(400));
        Ok(vec![1.0, 0.0])
    }
}

#[tokio::test]
async fn query_timeout_reports_subsecond_deadline() {
    let tmp = TempDir::new().unwrap();
    let mut catalog = ModelCatalog::empty(Path::new("models"));
    catalog.register(ModelSpec::new(
        "hang",
        "Hanging",
        Backend::Custom { dim: 2, loader: Arc::new(|_spec: &ModelSpec| Ok(Arc::new(HangingEmbedder) as Arc<dyn ImageEmbedder>)) },
    ));
    let session = QuerySession::new(catalog, tmp.path()).with_timeout(Some(Duration::from_millis(50)));
    registry::upsert(&session.registry_path(), "hang", entry("Hanging", "hang", "2024-01-01T00:00:00Z")).unwrap();
    store::write_store(&tmp.path().join("hang_embeddings.json"), &[]).unwrap();

    let err = session.query(vec![1, 2, 3], "hang", 3).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(50)), "{err:?}");
    assert!(err.to_string().contains("50ms"), "{err}");
}
