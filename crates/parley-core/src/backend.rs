//! Model backend trait — the abstraction over text-completion services.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Model backend trait — implement this to relay to a new completion service.
///
/// # Example
///
/// ```rust,ignore
/// struct Echo;
///
/// #[async_trait]
/// impl ModelBackend for Echo {
///     fn name(&self) -> &str { "echo" }
///     fn model(&self) -> &str { "echo-1" }
///
///     async fn complete(&self, prompt: &str) -> Result<String> {
///         Ok(prompt.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Model the backend completes with.
    fn model(&self) -> &str;

    /// Complete a prompt. An `Ok` with empty text is a successful empty
    /// reply; unreachable services and bad responses are `Err`.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Probe whether the service is reachable right now.
    ///
    /// Never cached: a backend that comes up after start-up is picked up on
    /// the next probe.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on a single completion call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Alternate models tried, in order, when the primary model fails.
    #[serde(default)]
    pub fallback_models: Vec<String>,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "phi3:latest".to_string()
}

fn default_api_base() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_timeout_secs() -> u64 {
    120
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base: default_api_base(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            fallback_models: Vec::new(),
        }
    }
}
