use std::sync::Arc;

use bookrag_core::config::validate_params;
use bookrag_core::error::{Error, Result};
use bookrag_core::traits::{ChatModel, Retriever, TextEmbedder};
use bookrag_core::types::{Answer, QueryOutcome, RetrievalParams, SourceRef};

use crate::prompt::{build_context, build_prompt};

/// Retrieve-then-generate over a store built by [`crate::ingest`].
#[derive(Clone)]
pub struct RagPipeline {
    embedder: Arc<dyn TextEmbedder>,
    retriever: Arc<dyn Retriever>,
    chat: Arc<dyn ChatModel>,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        retriever: Arc<dyn Retriever>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        Self { embedder, retriever, chat }
    }

    pub fn embedder(&self) -> &Arc<dyn TextEmbedder> {
        &self.embedder
    }

    /// Answer `query` from the stored chunks.
    ///
    /// Returns [`QueryOutcome::NoMatch`] without calling the chat model when
    /// the store is empty or absent, or when the best hit scores below
    /// `params.relevance_threshold`.
    pub async fn answer(&self, query: &str, params: &RetrievalParams) -> Result<QueryOutcome> {
        validate_params(params)?;
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".into()));
        }
        if let Some(stored) = self.retriever.embedder_id() {
            let requested = self.embedder.model_id();
            if stored != requested {
                return Err(Error::EmbedderMismatch {
                    stored: stored.to_string(),
                    requested: requested.to_string(),
                });
            }
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let hits = self.retriever.retrieve(&query_vector, params.k).await?;
        let best = hits.first().map(|h| h.score);
        tracing::debug!(
            hits = hits.len(),
            ?best,
            threshold = params.relevance_threshold,
            "Retrieval done"
        );
        match best {
            Some(score) if score >= params.relevance_threshold => {}
            _ => {
                tracing::info!("No chunk cleared the relevance threshold");
                return Ok(QueryOutcome::NoMatch);
            }
        }

        let context = build_context(&hits);
        let prompt = build_prompt(&context, query);
        let text = self.chat.complete(&prompt).await?;
        let sources = hits
            .iter()
            .map(|h| SourceRef { source: h.chunk.source.clone(), score: h.score })
            .collect();
        Ok(QueryOutcome::Answered(Answer { text, prompt, sources, hits }))
    }
}
