//! Shared helpers for the relay server tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;

use parley_core::backend::ModelBackend;
use parley_core::error::{ParleyError, Result};
use parley_core::orchestrator::ChatOrchestrator;
use parley_core::session::SessionStore;
use parley_hub::api::{ApiState, SharedState};

/// Always replies `hello`.
pub struct HelloBackend;

#[async_trait]
impl ModelBackend for HelloBackend {
    fn name(&self) -> &str {
        "stub"
    }
    fn model(&self) -> &str {
        "hello-1"
    }
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok("hello".to_string())
    }
}

/// Never reachable.
pub struct OfflineBackend;

#[async_trait]
impl ModelBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }
    fn model(&self) -> &str {
        "none"
    }
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(ParleyError::Backend("connection refused".into()))
    }
    async fn is_available(&self) -> bool {
        false
    }
}

/// Fresh state with its own session store.
pub fn make_state(backend: Arc<dyn ModelBackend>) -> SharedState {
    let chat = ChatOrchestrator::new(Arc::new(SessionStore::new()), backend);
    Arc::new(ApiState::new(chat))
}
