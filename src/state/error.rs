use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize LLM provider: {0}")]
    Provider(#[source] anyhow::Error),

    #[error("Failed to initialize webhook client: {0}")]
    Webhook(#[source] anyhow::Error),
}
