pub mod fallback;
pub mod ollama;

use async_trait::async_trait;

use parley_core::backend::ModelBackend;
use parley_core::error::Result;

pub use fallback::FallbackBackend;
pub use ollama::OllamaBackend;

/// A backend that can complete with a model other than its default.
#[async_trait]
pub trait ModelSelect: ModelBackend {
    async fn complete_with(&self, model: &str, prompt: &str) -> Result<String>;
}
