use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Foundry error: {0}")]
    Foundry(#[from] crate::foundry::FoundryError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Other error: {0}")]
    Other(String),
}
