use std::path::Path;

use imgsim_embed::ModelCatalog;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let image = args.next().ok_or_else(|| anyhow::anyhow!("usage: embed <image> [model_key]"))?;
    let key = args.next().unwrap_or_else(|| "histogram".to_string());
    let catalog = ModelCatalog::builtin(Path::new("models"));
    let adapter = catalog.load_adapter(&key)?;
    let v = imgsim_core::traits::embed_checked(adapter.as_ref(), &std::fs::read(&image)?)?;
    println!("model={} dim={} head={:?}", adapter.model_key(), v.len(), &v[..v.len().min(8)]);
    Ok(())
}
