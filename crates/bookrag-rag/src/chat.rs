use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use bookrag_core::config::Settings;
use bookrag_core::error::{Error, Result};
use bookrag_core::traits::ChatModel;
use bookrag_embed::openai::api_error_message;

/// Chat model behind an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(base_url: &str, api_key: &str, model: &str, temperature: f32) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.openai.require_api_key()?;
        Ok(Self::new(
            &settings.openai.base_url,
            api_key,
            &settings.chat.model,
            settings.chat.temperature,
        ))
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting completion");
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Error::chat)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Chat(api_error_message(status, &text)));
        }

        let payload: ChatResponse = res.json().await.map_err(Error::chat)?;
        payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Chat("response contained no choices".into()))
    }
}
