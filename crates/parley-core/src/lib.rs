//! # Parley Core
//!
//! Shared types and the relay core: the bounded session store, prompt
//! rendering, the model backend trait, and the chat orchestrator that ties
//! them together. Every front-end depends on this crate.

pub mod backend;
pub mod config;
pub mod error;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod session;

pub use backend::{BackendConfig, ModelBackend};
pub use error::{ParleyError, Result};
pub use message::{Role, Turn};
pub use orchestrator::{ChatOrchestrator, TurnOutcome};
pub use session::SessionStore;
