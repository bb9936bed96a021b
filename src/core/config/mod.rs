pub mod defaults;
pub mod paths;
pub mod service;
pub mod settings;
pub mod validation;

pub use defaults::DEFAULT_SYSTEM_PROMPT;
pub use paths::AppPaths;
pub use service::ConfigService;
pub use settings::{
    chunker_settings, generation_settings, provider_settings, retrieval_settings,
    server_settings, session_settings, system_prompt, webhook_settings, ChunkerSettings,
    GenerationSettings, ProviderSettings, RetrievalSettings, ServerSettings, SessionSettings,
    WebhookSettings,
};
pub use validation::validate_config;
