use clap::Parser;

use imgsim_cli::{init_tracing, App};
use imgsim_index::QuerySession;

/// List registered model keys and the stores built for them.
#[derive(Parser, Debug)]
#[command(name = "imgsim-models", version)]
struct Args {
    /// Directory holding stores and the registry (defaults to `paths.data_dir`)
    #[arg(long, short = 'd')]
    data_dir: Option<String>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let app = App::load()?;
    let mut session = QuerySession::from_settings(app.catalog.clone(), &app.settings, &app.base);
    if let Some(dir) = args.data_dir.as_deref() {
        session = session.with_data_dir(&app.resolve(dir));
    }
    let registry = session.available_stores()?;

    println!("{:<12} {:<24} {:>6}  last built", "key", "name", "dim");
    for spec in app.catalog.specs() {
        let built = registry
            .get(&spec.key)
            .map_or_else(|| "never".to_string(), |e| format!("{} ({})", e.last_updated.to_rfc3339(), e.filename));
        let marker = if spec.key == app.settings.models.default { "*" } else { " " };
        println!("{marker}{:<11} {:<24} {:>6}  {built}", spec.key, spec.name, spec.dim());
    }
    for (key, entry) in registry.iter().filter(|(k, _)| !app.catalog.contains(k)) {
        println!(" {key:<11} {:<24} {:>6}  {} ({}) [not in catalog]", entry.name, "?", entry.last_updated.to_rfc3339(), entry.filename);
    }
    Ok(())
}
