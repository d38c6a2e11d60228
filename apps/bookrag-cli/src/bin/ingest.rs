use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use bookrag_core::config::Settings;
use bookrag_core::logging;
use bookrag_embed::get_default_embedder;

/// Rebuild the vector store from the source documents.
#[derive(Parser, Debug)]
#[command(name = "bookrag-ingest", version, about)]
struct Args {
    /// Source directory; overrides `data.source_dir`
    data_dir: Option<PathBuf>,

    /// Store directory; overrides `data.store_dir`
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();
    let args = Args::parse();

    let mut settings = Settings::load().context("loading configuration")?;
    if let Some(dir) = args.data_dir {
        settings.data.source_dir = dir.to_string_lossy().to_string();
    }
    if let Some(dir) = args.store_dir {
        settings.data.store_dir = dir.to_string_lossy().to_string();
    }

    println!("Data directory: {}", settings.data.source_path().display());
    let embedder = get_default_embedder(&settings)?;
    let report = bookrag_rag::ingest(&settings, embedder.as_ref())
        .await
        .context("ingestion failed")?;
    println!(
        "✅ Saved {} chunks from {} documents to {}.",
        report.chunks, report.documents, report.store_dir
    );
    Ok(())
}
