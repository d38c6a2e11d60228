use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("OPENAI_API_KEY is not set; add it to the environment or a .env file")]
    MissingApiKey,

    #[error("No vector store found at {0}; run `bookrag-ingest` first")]
    StoreNotFound(PathBuf),

    #[error("Store was built with embedder '{stored}' but the query uses '{requested}'")]
    EmbedderMismatch { stored: String, requested: String },

    #[error("Embedding request failed: {0}")]
    Embedding(String),

    #[error("Chat completion failed: {0}")]
    Chat(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        Error::Store(err.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        Error::Embedding(err.to_string())
    }

    pub fn chat<E: std::fmt::Display>(err: E) -> Self {
        Error::Chat(err.to_string())
    }

    /// True for failures of a remote service call.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Embedding(_) | Error::Chat(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
