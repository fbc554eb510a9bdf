use clap::Parser;
use tracing::{error, info, warn};

use imgsim_cli::{init_tracing, App};
use imgsim_core::Error;
use imgsim_index::{IngestionPipeline, PipelineOptions};

/// Embed every image under the asset root and write the store for one model.
#[derive(Parser, Debug)]
#[command(name = "imgsim-build", version)]
struct Args {
    /// Model key (defaults to `models.default`)
    model: Option<String>,
    /// Asset root (defaults to `paths.assets_dir`)
    #[arg(long, short = 'a')]
    assets: Option<String>,
    /// Output directory for stores and the registry (defaults to `paths.data_dir`)
    #[arg(long, short = 'o')]
    data_dir: Option<String>,
    /// Concurrent adapter calls
    #[arg(long, short = 'w')]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let app = App::load()?;
    let model_key = app.model_key(args.model.as_deref()).to_string();
    let assets = app.resolve(args.assets.as_deref().unwrap_or(&app.settings.paths.assets_dir));

    let mut options = PipelineOptions::from_settings(&app.settings, &app.base);
    if let Some(dir) = args.data_dir.as_deref() { options.data_dir = app.resolve(dir); }
    if let Some(w) = args.workers { options.workers = w.max(1); }

    let pipeline = IngestionPipeline::new(app.catalog.clone(), options);
    let summary = match pipeline.build(&assets, &model_key).await {
        Ok(s) => s,
        Err(e @ Error::UnknownModel(_)) => {
            error!("{e}");
            error!("available models: {}", app.available_models());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    for (path, err) in &summary.failures { warn!("failed: {path}: {err}"); }
    info!(
        "done: model={} succeeded={} failed={} store={}",
        model_key,
        summary.succeeded,
        summary.failed,
        summary.store_path.display()
    );
    println!("{} succeeded, {} failed -> {}", summary.succeeded, summary.failed, summary.store_path.display());
    Ok(())
}
