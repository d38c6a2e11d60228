use async_trait::async_trait;

use crate::error::Result;
use crate::types::RetrievalResult;

/// Turns text into vectors. Ingestion and query must use the same
/// `model_id`, otherwise similarity scores are meaningless.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    fn model_id(&self) -> &str;
    /// Embed a batch of texts; output order matches input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Nearest-neighbour lookup over stored chunks.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Identifier of the embedder the stored vectors came from, if recorded.
    fn embedder_id(&self) -> Option<&str>;
    /// Up to `k` results ordered by descending score. An empty or absent
    /// store yields an empty vector.
    async fn retrieve(&self, query_vector: &[f32], k: usize) -> Result<Vec<RetrievalResult>>;
}
