use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use bookrag_core::config::Settings;
use bookrag_core::logging;
use bookrag_web::{router, AppState};

/// Serve the question-answering page.
#[derive(Parser, Debug)]
#[command(name = "bookrag-web", version, about)]
struct Args {
    /// Bind address; overrides `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Port; overrides `server.port`
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();
    let args = Args::parse();

    let settings = Settings::load().context("loading configuration")?;
    let host = args.host.unwrap_or_else(|| settings.server.host.clone());
    let port = args.port.unwrap_or(settings.server.port);
    if !settings.openai.has_api_key() {
        tracing::warn!("OPENAI_API_KEY is not set; queries will be refused until it is");
    }

    let state = Arc::new(AppState::new(settings));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {}:{}", host, port))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
