use indicatif::{ProgressBar, ProgressStyle};

use bookrag_core::config::Settings;
use bookrag_core::data_processor::DataProcessor;
use bookrag_core::error::Result;
use bookrag_core::traits::TextEmbedder;
use bookrag_core::types::IngestReport;
use bookrag_vector::StoreBuilder;

/// Rebuild the store from `settings.data.source_dir`.
///
/// Chunks are embedded in batches of `embedding.batch_size` and written to a
/// staging directory; the live store is only replaced once everything has
/// been written. Any error leaves the previous store in place.
pub async fn ingest(settings: &Settings, embedder: &dyn TextEmbedder) -> Result<IngestReport> {
    let source_dir = settings.data.source_path();
    let store_dir = settings.data.store_path();
    let processor = DataProcessor::new(&settings.data, &settings.chunking)?;
    let (documents, chunks) = processor.process_directory(&source_dir)?;

    let mut builder = StoreBuilder::create(&store_dir).await?;
    let batch_size = settings.embedding.batch_size.max(1);
    let pb = progress_bar(chunks.len() as u64);
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_documents(&texts).await?;
        builder.add(batch, &vectors).await?;
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    let meta = builder.commit(embedder.model_id(), documents.len()).await?;
    Ok(IngestReport {
        documents: documents.len(),
        chunks: meta.chunk_count,
        store_dir: store_dir.to_string_lossy().to_string(),
    })
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(concat!(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] ",
            "{pos}/{len} chunks ({percent}%) {msg}",
        ))
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message("embedding");
    pb
}
