use std::sync::Arc;

use serde_json::Value;

use crate::cache::ContextCache;
use crate::chat::{ChatService, Generator};
use crate::core::config::{self, AppPaths, ConfigService};
use crate::ingest::{DocumentExtractor, IngestService, PlainTextExtractor};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::rag::{CorpusIndex, EmbeddingService, Retriever};
use crate::session::SessionStore;
use crate::webhook::WebhookClient;

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes and background tasks.
///
/// Contains references to:
/// - Configuration and paths
/// - The vector index, context cache, and session store
/// - The ingest and chat services built on top of them
/// - The CRM webhook client
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub index: Arc<CorpusIndex>,
    pub context_cache: Arc<ContextCache>,
    pub sessions: Arc<SessionStore>,
    pub extractor: Arc<dyn DocumentExtractor>,
    pub ingest: Arc<IngestService>,
    pub chat: Arc<ChatService>,
    pub webhook: Arc<WebhookClient>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Setting up paths and loading configuration
    /// 2. Building the OpenAI-compatible provider client
    /// 3. Wiring the retrieval, chat, and webhook services
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let config_service = ConfigService::new(paths.clone());

        config_service
            .ensure_default_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        let config = config_service
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        config::validate_config(&config).map_err(|e| InitializationError::Config(e.into()))?;

        let provider = Arc::new(
            OpenAiProvider::new(config::provider_settings(&config))
                .map_err(|e| InitializationError::Provider(e.into()))?,
        );

        Self::assemble(
            paths,
            config_service,
            &config,
            provider,
            Arc::new(PlainTextExtractor),
        )
    }

    /// Wires the services from an already-loaded configuration. Split out of
    /// `initialize` so tests can inject their own provider and extractor.
    pub fn assemble(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: &Value,
        provider: Arc<dyn LlmProvider>,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Result<Arc<Self>, InitializationError> {
        let retrieval = config::retrieval_settings(settings);
        let session_cfg = config::session_settings(settings);
        let chunker = config::chunker_settings(settings);
        let generation = config::generation_settings(settings);
        let system_prompt = config::system_prompt(settings);
        let webhook_cfg = config::webhook_settings(settings);

        tracing::info!("Using LLM provider '{}'", provider.name());

        let index = Arc::new(CorpusIndex::new());
        let context_cache = Arc::new(ContextCache::new(
            retrieval.cache_ttl,
            retrieval.cache_max_entries,
        ));
        let sessions = Arc::new(SessionStore::new(
            session_cfg.idle_timeout,
            session_cfg.max_turns,
        ));
        let embeddings = Arc::new(EmbeddingService::new(
            provider.clone(),
            retrieval.embedding_cache_size,
        ));
        let retriever = Arc::new(Retriever::new(
            embeddings.clone(),
            index.clone(),
            retrieval.top_k,
        ));
        let generator = Arc::new(Generator::new(provider, system_prompt, generation));

        let webhook = Arc::new(
            WebhookClient::new(webhook_cfg)
                .map_err(|e| InitializationError::Webhook(e.into()))?,
        );
        if !webhook.is_configured() {
            tracing::warn!("No CRM webhook URL configured; leads will not be delivered");
        }

        let ingest = Arc::new(IngestService::new(
            chunker,
            embeddings,
            index.clone(),
            context_cache.clone(),
            sessions.clone(),
        ));
        let chat = Arc::new(ChatService::new(
            sessions.clone(),
            context_cache.clone(),
            retriever,
            generator,
        ));

        Ok(Arc::new(AppState {
            paths,
            config,
            index,
            context_cache,
            sessions,
            extractor,
            ingest,
            chat,
            webhook,
        }))
    }
}
