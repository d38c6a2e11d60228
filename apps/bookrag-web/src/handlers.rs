use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use bookrag_core::config::{validate_params, MAX_K};
use bookrag_core::error::Error;
use bookrag_core::traits::Retriever;
use bookrag_core::types::{QueryOutcome, RetrievalParams, RetrievalResult};
use bookrag_rag::RagPipeline;

use crate::error::ApiError;
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Characters of chunk content shown per source.
pub const PREVIEW_CHARS: usize = 500;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let params = state.settings.retrieval.params();
    Html(
        INDEX_HTML
            .replace("{{DEFAULT_K}}", &params.k.to_string())
            .replace("{{DEFAULT_THRESHOLD}}", &format!("{:.1}", params.relevance_threshold)),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub api_key_loaded: bool,
    pub database_found: bool,
    pub chunk_count: usize,
    pub embedder_id: Option<String>,
    /// Set when the store exists but could not be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Always answers 200. Store failures are reported in `error`.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let mut response = StatusResponse {
        api_key_loaded: state.api_key_loaded(),
        database_found: false,
        chunk_count: 0,
        embedder_id: None,
        error: None,
    };
    match state.store().await {
        Ok(store) => {
            response.database_found = store.is_present();
            response.embedder_id = store.embedder_id().map(str::to_string);
            match store.count_rows().await {
                Ok(n) => response.chunk_count = n,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to count stored chunks");
                    response.error = Some(e.to_string());
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to open vector store");
            response.error = Some(e.to_string());
        }
    }
    Json(response)
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub k: Option<i64>,
    pub relevance_threshold: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourceView {
    pub source: String,
    pub file_name: String,
    pub score: f32,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    pub answer: Option<String>,
    pub sources: Vec<SourceView>,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(req) = payload?;
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Please enter a query.".into()));
    }
    let defaults = state.settings.retrieval.params();
    let k = match req.k {
        Some(k) => usize::try_from(k).map_err(|_| {
            ApiError::BadRequest(format!("k must be between 1 and {}, got {}", MAX_K, k))
        })?,
        None => defaults.k,
    };
    let params = RetrievalParams {
        k,
        relevance_threshold: req.relevance_threshold.unwrap_or(defaults.relevance_threshold),
    };
    validate_params(&params)?;

    if !state.api_key_loaded() {
        return Err(Error::MissingApiKey.into());
    }
    let store = state.store().await?;
    if !store.is_present() {
        return Err(Error::StoreNotFound(store.path().to_path_buf()).into());
    }

    let pipeline = RagPipeline::new(state.embedder().await?, store, state.chat().await?);
    tracing::info!(k = params.k, threshold = params.relevance_threshold, "Query: {}", req.query);
    let response = match pipeline.answer(&req.query, &params).await? {
        QueryOutcome::NoMatch => QueryResponse {
            status: "no_match".into(),
            answer: None,
            sources: Vec::new(),
        },
        QueryOutcome::Answered(answer) => QueryResponse {
            status: "answered".into(),
            answer: Some(answer.text),
            sources: answer.hits.iter().map(source_view).collect(),
        },
    };
    Ok(Json(response))
}

fn source_view(hit: &RetrievalResult) -> SourceView {
    let file_name = Path::new(&hit.chunk.source)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| hit.chunk.source.clone());
    SourceView {
        source: hit.chunk.source.clone(),
        file_name,
        score: hit.score,
        content: preview(&hit.chunk.content, PREVIEW_CHARS),
    }
}

/// First `max_chars` characters, with "..." appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
