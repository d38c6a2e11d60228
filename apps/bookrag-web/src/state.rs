use std::sync::Arc;

use tokio::sync::OnceCell;

use bookrag_core::config::Settings;
use bookrag_core::error::Result;
use bookrag_core::traits::{ChatModel, TextEmbedder};
use bookrag_embed::get_default_embedder;
use bookrag_rag::OpenAiChat;
use bookrag_vector::LanceStore;

/// Shared server state. Remote clients and the store handle are created on
/// first use and kept for the life of the process.
pub struct AppState {
    pub settings: Settings,
    embedder: OnceCell<Arc<dyn TextEmbedder>>,
    chat: OnceCell<Arc<dyn ChatModel>>,
    store: OnceCell<Arc<LanceStore>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            embedder: OnceCell::new(),
            chat: OnceCell::new(),
            store: OnceCell::new(),
        }
    }

    /// State with pre-built clients, bypassing the environment lookup.
    pub fn with_clients(
        settings: Settings,
        embedder: Arc<dyn TextEmbedder>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            settings,
            embedder: OnceCell::new_with(Some(embedder)),
            chat: OnceCell::new_with(Some(chat)),
            store: OnceCell::new(),
        }
    }

    pub fn api_key_loaded(&self) -> bool {
        self.chat.initialized() || self.settings.openai.has_api_key()
    }

    pub async fn embedder(&self) -> Result<Arc<dyn TextEmbedder>> {
        self.embedder
            .get_or_try_init(|| async { get_default_embedder(&self.settings) })
            .await
            .cloned()
    }

    pub async fn chat(&self) -> Result<Arc<dyn ChatModel>> {
        self.chat
            .get_or_try_init(|| async {
                let chat: Arc<dyn ChatModel> = Arc::new(OpenAiChat::from_settings(&self.settings)?);
                Ok(chat)
            })
            .await
            .cloned()
    }

    /// The store handle. A missing store is reopened on every call until one
    /// has been ingested, then cached.
    pub async fn store(&self) -> Result<Arc<LanceStore>> {
        if let Some(store) = self.store.get() {
            return Ok(store.clone());
        }
        let store = Arc::new(LanceStore::open(&self.settings.data.store_path()).await?);
        if store.is_present() {
            tracing::info!(path = %store.path().display(), "Opened vector store");
            // Err only if another request set it first
            let _ = self.store.set(store.clone());
        }
        Ok(store)
    }
}
