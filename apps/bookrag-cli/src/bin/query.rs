use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use bookrag_core::config::Settings;
use bookrag_core::error::Error;
use bookrag_core::logging;
use bookrag_core::types::QueryOutcome;
use bookrag_embed::get_default_embedder;
use bookrag_rag::{OpenAiChat, RagPipeline};
use bookrag_vector::LanceStore;

/// Answer a question from the ingested documents.
#[derive(Parser, Debug)]
#[command(name = "bookrag-query", version, about)]
struct Args {
    /// The question to answer
    query_text: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();
    let args = Args::parse();

    let settings = Settings::load().context("loading configuration")?;
    let params = settings.retrieval.params();

    let store_path = settings.data.store_path();
    let store = LanceStore::open(&store_path).await?;
    if !store.is_present() {
        tracing::warn!("{}", Error::StoreNotFound(store_path.clone()));
    }
    let embedder = get_default_embedder(&settings)?;
    let chat = OpenAiChat::from_settings(&settings)?;
    let pipeline = RagPipeline::new(embedder, Arc::new(store), Arc::new(chat));

    match pipeline.answer(&args.query_text, &params).await? {
        QueryOutcome::NoMatch => println!("Unable to find matching results."),
        QueryOutcome::Answered(answer) => {
            println!("{}", answer.prompt);
            let sources: Vec<&str> = answer.sources.iter().map(|s| s.source.as_str()).collect();
            println!("Response: {}\nSources: {:?}", answer.text, sources);
        }
    }
    Ok(())
}
