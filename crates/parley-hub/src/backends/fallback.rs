//! Backend with automatic model fallback.
//!
//! Wraps any [`ModelSelect`] backend and tries alternative models if the
//! primary fails.

use async_trait::async_trait;
use tracing::{info, warn};

use parley_core::backend::ModelBackend;
use parley_core::error::{ParleyError, Result};

use super::ModelSelect;

/// Backend wrapper that supports automatic model fallback.
///
/// If the primary model fails, it tries the fallback models in order with
/// the same prompt. Only when every model fails does the call fail.
pub struct FallbackBackend<B: ModelSelect> {
    inner: B,
    fallback_models: Vec<String>,
}

impl<B: ModelSelect> FallbackBackend<B> {
    /// Create a new fallback backend.
    pub fn new(inner: B, fallbacks: Vec<String>) -> Self {
        Self {
            inner,
            fallback_models: fallbacks,
        }
    }
}

#[async_trait]
impl<B: ModelSelect> ModelBackend for FallbackBackend<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.inner.complete(prompt).await {
            Ok(reply) => return Ok(reply),
            Err(e) => {
                if self.fallback_models.is_empty() {
                    return Err(e);
                }
                warn!(
                    "Primary model failed: {}. Trying {} fallback(s)...",
                    e,
                    self.fallback_models.len()
                );
            }
        }

        for (i, model) in self.fallback_models.iter().enumerate() {
            info!(
                "Trying fallback model {}/{}: {}",
                i + 1,
                self.fallback_models.len(),
                model
            );

            match self.inner.complete_with(model, prompt).await {
                Ok(reply) => {
                    info!("Fallback model {} succeeded", model);
                    return Ok(reply);
                }
                Err(e) => {
                    warn!("Fallback model {} failed: {}", model, e);
                }
            }
        }

        Err(ParleyError::Backend(
            "All models (primary + fallbacks) failed".to_string(),
        ))
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Only `working` succeeds; records the models it was asked for.
    struct PickyBackend {
        working: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl PickyBackend {
        fn new(working: Option<&'static str>) -> Self {
            Self {
                working,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelBackend for PickyBackend {
        fn name(&self) -> &str {
            "picky"
        }
        fn model(&self) -> &str {
            "primary"
        }
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.complete_with("primary", prompt).await
        }
    }

    #[async_trait]
    impl ModelSelect for PickyBackend {
        async fn complete_with(&self, model: &str, _prompt: &str) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            if self.working == Some(model) {
                Ok(format!("from {}", model))
            } else {
                Err(ParleyError::Backend(format!("{} is down", model)))
            }
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallbacks() {
        let backend = FallbackBackend::new(PickyBackend::new(Some("primary")), vec!["b".into()]);
        assert_eq!(backend.complete("p").await.unwrap(), "from primary");
        assert_eq!(*backend.inner.calls.lock().unwrap(), ["primary"]);
    }

    #[tokio::test]
    async fn test_fallbacks_tried_in_order() {
        let backend = FallbackBackend::new(
            PickyBackend::new(Some("c")),
            vec!["b".into(), "c".into(), "d".into()],
        );
        assert_eq!(backend.complete("p").await.unwrap(), "from c");
        assert_eq!(*backend.inner.calls.lock().unwrap(), ["primary", "b", "c"]);
    }

    #[tokio::test]
    async fn test_all_failing_is_error() {
        let backend = FallbackBackend::new(PickyBackend::new(None), vec!["b".into()]);
        assert!(matches!(
            backend.complete("p").await.unwrap_err(),
            ParleyError::Backend(_)
        ));
    }

    #[tokio::test]
    async fn test_no_fallbacks_returns_original_error() {
        let backend = FallbackBackend::new(PickyBackend::new(None), vec![]);
        let err = backend.complete("p").await.unwrap_err();
        assert!(err.to_string().contains("primary is down"));
    }
}
