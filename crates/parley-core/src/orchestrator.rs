//! Chat orchestrator — one request/response cycle of the relay.
//!
//! Every front-end goes through [`ChatOrchestrator::handle_turn`]:
//! 1. Read the session's history
//! 2. Render the prompt
//! 3. Call the model backend (bounded by a timeout)
//! 4. Record the user turn and the reply
//! 5. Return the reply
//!
//! Backend trouble never escapes: a failed, timed-out, or blank completion is
//! replaced by a canned offline reply, which is stored like any other.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::backend::ModelBackend;
use crate::error::{ParleyError, Result};
use crate::prompt;
use crate::session::SessionStore;

/// Replies used when the backend cannot answer.
pub const FALLBACK_REPLIES: [&str; 3] = [
    "The local model server is not reachable right now. This is a default fallback reply.",
    "I'm currently in offline mode because the local model server is not reachable.",
    "Fallback response: please start the local model server to get real answers.",
];

/// Pick one of the [`FALLBACK_REPLIES`] at random.
pub fn fallback_reply() -> &'static str {
    FALLBACK_REPLIES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(FALLBACK_REPLIES[0])
}

/// Default bound on a single backend call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Result of one turn, with how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    /// True when the reply is a canned fallback rather than a completion.
    pub fallback: bool,
}

/// Composes the session store, prompt rendering, and a model backend.
pub struct ChatOrchestrator {
    store: Arc<SessionStore>,
    backend: Arc<dyn ModelBackend>,
    timeout: Duration,
}

impl ChatOrchestrator {
    pub fn new(store: Arc<SessionStore>, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            store,
            backend,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the backend call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn backend(&self) -> &Arc<dyn ModelBackend> {
        &self.backend
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one chat turn and return the reply. Never fails and never
    /// returns an empty string.
    pub async fn handle_turn(&self, session_id: &str, user_text: &str) -> String {
        self.handle_turn_detailed(session_id, user_text).await.reply
    }

    /// Same as [`handle_turn`](Self::handle_turn), also reporting whether the
    /// reply is a fallback.
    pub async fn handle_turn_detailed(&self, session_id: &str, user_text: &str) -> TurnOutcome {
        let started = Instant::now();

        let history = self.store.get_history(session_id);
        let prompt = prompt::render(&history, user_text);

        debug!(
            "Session {}: {} prior turn(s), prompt {} chars",
            session_id,
            history.len(),
            prompt.len()
        );

        // No store lock is held here; only the append below touches the session.
        let outcome = match self.complete(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => TurnOutcome {
                reply,
                fallback: false,
            },
            Ok(_) => {
                warn!(
                    "{} returned an empty completion, using fallback",
                    self.backend.name()
                );
                Self::fallback()
            }
            Err(e) => {
                warn!("{} unavailable, using fallback: {}", self.backend.name(), e);
                Self::fallback()
            }
        };

        self.store
            .append_exchange(session_id, user_text, &outcome.reply);

        info!(
            "Session {}: turn completed in {:.1}ms ({} chars{})",
            session_id,
            started.elapsed().as_secs_f64() * 1000.0,
            outcome.reply.len(),
            if outcome.fallback { ", fallback" } else { "" }
        );

        outcome
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.backend.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ParleyError::Timeout(self.timeout)),
        }
    }

    fn fallback() -> TurnOutcome {
        TurnOutcome {
            reply: fallback_reply().to_string(),
            fallback: true,
        }
    }
}
