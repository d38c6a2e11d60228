//! bookrag-rag
//!
//! Ingestion (load, split, embed, store) and the question-answering
//! pipeline (embed query, retrieve, gate on relevance, prompt the chat model).

pub mod chat;
pub mod ingest;
pub mod pipeline;
pub mod prompt;

pub use chat::OpenAiChat;
pub use ingest::ingest;
pub use pipeline::RagPipeline;
