use std::path::Path;

use imgsim_embed::ModelCatalog;
use imgsim_index::QuerySession;

fn main() -> anyhow::Result<()> {
    let ws_root = Path::new(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap_or(Path::new("."));
    let data_dir = ws_root.join("data");
    let session = QuerySession::new(ModelCatalog::builtin(&ws_root.join("models")), &data_dir);
    let registry = session.available_stores()?;
    println!("registry: {} entries in {}", registry.len(), session.registry_path().display());
    for (key, entry) in &registry {
        match session.load_store(key) {
            Ok(store) => {
                let with_vec = store.iter().filter(|r| r.features.is_some()).count();
                println!("{key}: records={} with_features={with_vec} built={}", store.len(), entry.last_updated);
            }
            Err(e) => println!("{key}: {e}"),
        }
    }
    Ok(())
}
