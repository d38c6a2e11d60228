//! Domain types shared by ingestion and query.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A source document as loaded from disk.
///
/// `source` is the path the document was discovered at; it is carried into
/// every chunk and reported back as the attribution of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub content: String,
}

/// A contiguous slice of a [`Document`] that is embedded and stored.
///
/// - `id`: `"{source}:{chunk_index}"`, stable across ingestion runs
/// - `start_index`: offset of the first character within the source document
/// - `chunk_index`: position among the chunks of the same document
/// - `content_hash`: blake3 hex digest of `content`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source: String,
    pub content: String,
    pub start_index: usize,
    pub chunk_index: usize,
    pub content_hash: String,
}

impl Chunk {
    pub fn new(source: &str, content: String, start_index: usize, chunk_index: usize) -> Self {
        let content_hash = blake3::hash(content.as_bytes()).to_hex().to_string();
        Self {
            id: format!("{}:{}", source, chunk_index),
            source: source.to_string(),
            content,
            start_index,
            chunk_index,
            content_hash,
        }
    }

    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A stored chunk paired with its relevance to a query. `score` lies in
/// `[0, 1]`; higher is more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Attribution for one chunk used to build an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source: String,
    pub score: f32,
}

/// Retrieval knobs for a single query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalParams {
    pub k: usize,
    pub relevance_threshold: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self { k: 3, relevance_threshold: 0.7 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub prompt: String,
    pub sources: Vec<SourceRef>,
    pub hits: Vec<RetrievalResult>,
}

/// Result of a query. `NoMatch` is a normal outcome: nothing in the store
/// cleared the relevance threshold and the chat model was not consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryOutcome {
    NoMatch,
    Answered(Answer),
}

impl QueryOutcome {
    pub fn answer_text(&self) -> Option<&str> {
        match self {
            QueryOutcome::NoMatch => None,
            QueryOutcome::Answered(a) => Some(&a.text),
        }
    }

    pub fn sources(&self) -> &[SourceRef] {
        match self {
            QueryOutcome::NoMatch => &[],
            QueryOutcome::Answered(a) => &a.sources,
        }
    }
}

/// Summary of a completed ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
    pub store_dir: String,
}
