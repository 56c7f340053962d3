//! HTTP server — expose the relay to any client.
//!
//! Endpoints:
//! - POST   /chat — Send a message and get the reply
//! - GET    /ws — Socket carrying many message/reply exchanges
//! - GET    /health — Liveness plus a fresh backend probe
//! - GET    /status — Backend, session count, and metrics
//! - GET    /sessions — Known session ids
//! - GET    /sessions/{id} — A session's turns
//! - DELETE /sessions/{id} — Clear a session

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use parley_core::config::ServerSettings;
use parley_core::message::Turn;
use parley_core::orchestrator::ChatOrchestrator;

use crate::metrics::{SharedMetrics, new_metrics};
use crate::middleware::logging_middleware;
use crate::ws;

/// Shared API state.
///
/// No lock wraps the orchestrator: the session store serializes per
/// session, so turns on different sessions run in parallel.
pub struct ApiState {
    pub chat: ChatOrchestrator,
    pub metrics: SharedMetrics,
}

impl ApiState {
    pub fn new(chat: ChatOrchestrator) -> Self {
        Self {
            chat,
            metrics: new_metrics(),
        }
    }
}

pub type SharedState = Arc<ApiState>;

// ─── Request/Response types ────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub backend: String,
    pub model: String,
    pub sessions: usize,
    pub max_turns: usize,
    pub timeout_secs: u64,
    pub metrics: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

// ─── Handlers ──────────────────────────────────────────────

async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let outcome = state
        .chat
        .handle_turn_detailed(&req.session_id, &req.message)
        .await;
    state.metrics.record_turn(outcome.fallback);

    Json(ChatResponse {
        response: outcome.reply,
    })
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let available = state.chat.backend().is_available().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        backend: if available { "available" } else { "unavailable" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn status(State(state): State<SharedState>) -> Json<StatusResponse> {
    let backend = state.chat.backend();
    let store = state.chat.store();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: backend.name().to_string(),
        model: backend.model().to_string(),
        sessions: store.len(),
        max_turns: store.max_turns(),
        timeout_secs: state.chat.timeout().as_secs(),
        metrics: state.metrics.to_json(),
    })
}

async fn list_sessions(State(state): State<SharedState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.chat.store().list_sessions(),
    })
}

async fn session_history(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Json<HistoryResponse> {
    let turns = state.chat.store().get_history(&session_id);
    Json(HistoryResponse { session_id, turns })
}

async fn clear_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    state.chat.store().clear(&session_id);
    info!("Session {} cleared", session_id);
    StatusCode::NO_CONTENT
}

// ─── Server builder ────────────────────────────────────────

/// Build the API router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/sessions", get(list_sessions))
        .route(
            "/sessions/{session_id}",
            get(session_history).delete(clear_session),
        )
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Any origin, method, and header, for browser clients served elsewhere.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Start the API server and run until Ctrl-C.
pub async fn start_server(state: ApiState, settings: &ServerSettings) -> anyhow::Result<()> {
    let shared = Arc::new(state);
    let mut app = build_router(shared.clone());
    if settings.cors_permissive {
        app = app.layer(cors_layer());
    }

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    info!("🌐 Relay listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        "Relay stopped, discarding {} session(s)",
        shared.chat.store().len()
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
