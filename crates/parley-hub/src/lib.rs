//! # Parley Hub
//!
//! Concrete model backends (Ollama, with model fallback), the HTTP and
//! WebSocket relay server, request logging middleware, and runtime metrics.

pub mod api;
pub mod backends;
pub mod metrics;
pub mod middleware;
pub mod ws;
