use async_trait::async_trait;
use thiserror::Error;

use crate::foundry::FoundryError;

// ============================================================================
// TextGenerator trait
// ============================================================================

/// Abstraction over the single text-generation call used by the orchestrator
/// and by safety rewrites.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`. `model` is a hint; backends that
    /// route to a fixed deployment may ignore it.
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Foundry(#[from] FoundryError),

    #[error("Text generator unavailable: {0}")]
    Unavailable(String),

    #[error("Generator returned an empty response")]
    EmptyResponse,
}
