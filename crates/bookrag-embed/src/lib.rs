//! bookrag-embed
//!
//! [`TextEmbedder`] implementations: the remote OpenAI embedder used in
//! production and a hash-based fake for offline development.

use std::sync::Arc;

use bookrag_core::config::Settings;
use bookrag_core::error::Result;
use bookrag_core::traits::TextEmbedder;

pub mod fake;
pub mod openai;

pub use fake::FakeEmbedder;
pub use openai::OpenAiEmbedder;

/// Dimension of `text-embedding-ada-002`, reused by the fake embedder.
pub const FAKE_DIM: usize = 1536;

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// The embedder for this process: [`FakeEmbedder`] when
/// `APP_USE_FAKE_EMBEDDINGS=1`, otherwise [`OpenAiEmbedder`], which requires
/// an API key.
pub fn get_default_embedder(settings: &Settings) -> Result<Arc<dyn TextEmbedder>> {
    if use_fake_embeddings() {
        tracing::warn!("Using FakeEmbedder; similarity scores are not semantic");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_DIM)));
    }
    Ok(Arc::new(OpenAiEmbedder::from_settings(settings)?))
}
