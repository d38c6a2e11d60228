use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use bookrag_core::config::Settings;
use bookrag_core::error::{Error, Result};
use bookrag_core::traits::TextEmbedder;

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Human-readable message for a failed API call. Prefers the
/// `{"error": {"message": ..}}` envelope, falls back to the raw body.
pub fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => format!("{}: {}", status, parsed.error.message),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{}: {}", status, body.trim()),
    }
}

impl OpenAiEmbedder {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.openai.require_api_key()?;
        Ok(Self::new(&settings.openai.base_url, api_key, &settings.embedding.model))
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest { model: &self.model, input, encoding_format: "float" };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Error::embedding)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Embedding(api_error_message(status, &text)));
        }

        let mut payload: EmbeddingResponse = res.json().await.map_err(Error::embedding)?;
        if payload.data.len() != input.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                input.len(),
                payload.data.len()
            )));
        }
        payload.data.sort_by_key(|d| d.index);
        Ok(payload.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl TextEmbedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(model = %self.model, count = texts.len(), "Embedding batch");
        self.request(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::Embedding("empty embedding response".into()))
    }
}
