use clap::Parser;
use std::time::Instant;

use imgsim_cli::{format_hit, init_tracing, App};
use imgsim_index::QuerySession;

/// Find the stored images most similar to a query image.
#[derive(Parser, Debug)]
#[command(name = "imgsim-query", version)]
struct Args {
    /// Query image path
    image: String,
    /// Model key (defaults to `models.default`)
    #[arg(long, short = 'm')]
    model: Option<String>,
    /// Number of results (defaults to `query.top_k`)
    #[arg(long, short = 'k')]
    limit: Option<usize>,
    /// Directory holding stores and the registry (defaults to `paths.data_dir`)
    #[arg(long, short = 'd')]
    data_dir: Option<String>,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let app = App::load()?;
    let model_key = app.model_key(args.model.as_deref()).to_string();
    let top_k = args.limit.unwrap_or(app.settings.query.top_k);

    let mut session = QuerySession::from_settings(app.catalog.clone(), &app.settings, &app.base);
    if let Some(dir) = args.data_dir.as_deref() {
        session = session.with_data_dir(&app.resolve(dir));
    }

    let bytes = std::fs::read(app.resolve(&args.image))?;
    let start = Instant::now();
    let results = session.query(bytes, &model_key, top_k).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    println!("Query: {}  model: {}  ({} results in {:?})", args.image, model_key, results.len(), start.elapsed());
    for (i, hit) in results.iter().enumerate() {
        println!("{}", format_hit(i + 1, hit));
    }
    Ok(())
}
