//! Layered configuration and path helpers.
//!
//! Figment merges built-in defaults, `config.toml`, `config.<env>.toml`,
//! `OPENAI_API_KEY` and `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_RETRIEVAL__K=5`), in that order.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::RetrievalParams;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingSettings,
    pub openai: OpenAiSettings,
    pub embedding: EmbeddingSettings,
    pub chat: ChatSettings,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub source_dir: String,
    pub extensions: Vec<String>,
    pub recursive: bool,
    pub store_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source_dir: "data/books".to_string(),
            extensions: vec!["md".to_string()],
            recursive: false,
            store_dir: "store".to_string(),
        }
    }
}

impl DataSettings {
    pub fn source_path(&self) -> PathBuf {
        expand_path(&self.source_dir)
    }

    pub fn store_path(&self) -> PathBuf {
        expand_path(&self.store_dir)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 300, chunk_overlap: 100 }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self { base_url: "https://api.openai.com/v1".to_string(), api_key: None }
    }
}

impl std::fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OpenAiSettings {
    /// The API key, or [`Error::MissingApiKey`] when absent or blank.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::MissingApiKey),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.require_api_key().is_ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model: "text-embedding-ada-002".to_string(), batch_size: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { model: "gpt-3.5-turbo".to_string(), temperature: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k: usize,
    pub relevance_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        let p = RetrievalParams::default();
        Self { k: p.k, relevance_threshold: p.relevance_threshold }
    }
}

impl RetrievalSettings {
    pub fn params(&self) -> RetrievalParams {
        RetrievalParams { k: self.k, relevance_threshold: self.relevance_threshold }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8501 }
    }
}

pub const MAX_K: usize = 10;

impl Settings {
    /// Load from the working directory and environment. `RUST_ENV` selects the
    /// overlay file (`dev` by default).
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::from_figment(Self::figment_for_env(&env_name))
    }

    pub fn figment_for_env(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "openai.api_key".into()))
            .merge(Env::prefixed("APP_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be positive".into()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be positive".into()));
        }
        validate_params(&self.retrieval.params()).map_err(|e| match e {
            Error::InvalidInput(msg) => Error::InvalidConfig(format!("retrieval: {}", msg)),
            other => other,
        })
    }
}

/// Check `k` is in `1..=MAX_K` and the threshold is in `[0, 1]`.
pub fn validate_params(params: &RetrievalParams) -> Result<()> {
    if params.k == 0 || params.k > MAX_K {
        return Err(Error::InvalidInput(format!(
            "k must be between 1 and {}, got {}",
            MAX_K, params.k
        )));
    }
    if !(0.0..=1.0).contains(&params.relevance_threshold) {
        return Err(Error::InvalidInput(format!(
            "relevance threshold must be between 0.0 and 1.0, got {}",
            params.relevance_threshold
        )));
    }
    Ok(())
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
