//! Ollama backend — raw prompt completion against a local Ollama server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use parley_core::backend::{BackendConfig, ModelBackend};
use parley_core::error::{ParleyError, Result};

use super::ModelSelect;

/// Completion backend for Ollama's `/api/generate` endpoint.
///
/// The prompt is sent as-is with no chat template, so the rendered
/// `role: content` transcript drives the model directly.
pub struct OllamaBackend {
    client: Client,
    config: BackendConfig,
    generate_url: String,
    tags_url: String,
}

impl OllamaBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let base = config.api_base.trim_end_matches('/');
        let generate_url = format!("{}/api/generate", base);
        let tags_url = format!("{}/api/tags", base);

        Ok(Self {
            client,
            config,
            generate_url,
            tags_url,
        })
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        info!("Calling ollama model: {}", model);

        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        let resp = self
            .client
            .post(&self.generate_url)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let body_text = resp.text().await?;

        debug!("Ollama response status: {}, body length: {}", status, body_text.len());

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<GenerateError>(&body_text) {
                return Err(ParleyError::Backend(format!(
                    "ollama error ({}): {}",
                    status, err.error
                )));
            }
            return Err(ParleyError::Backend(format!(
                "ollama error ({}): {}",
                status,
                truncate(&body_text, 200)
            )));
        }

        let generated: GenerateResponse = serde_json::from_str(&body_text).map_err(|e| {
            ParleyError::Backend(format!(
                "Failed to parse response: {} — body: {}",
                e,
                truncate(&body_text, 200)
            ))
        })?;

        Ok(generated.response)
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct GenerateError {
    error: String,
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.config.provider
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.generate(&self.config.model, prompt).await
    }

    async fn is_available(&self) -> bool {
        match self.client.get(&self.tags_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Ollama probe failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl ModelSelect for OllamaBackend {
    async fn complete_with(&self, model: &str, prompt: &str) -> Result<String> {
        self.generate(model, prompt).await
    }
}
