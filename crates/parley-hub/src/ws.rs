//! WebSocket endpoint — many chat exchanges over one connection.
//!
//! Client frames: `{"session_id": "...", "message": "..."}`.
//! Server frames: `{"response": "..."}`, or `{"error": "..."}` when a frame
//! is malformed. A rejected frame never touches the session store.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use parley_core::error::{ParleyError, Result};

use crate::api::SharedState;

/// Incoming frame. Fields are optional so a missing one can be reported
/// instead of failing the whole decode.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ClientFrame {
    fn validate(self) -> Result<(String, String)> {
        let session_id = self
            .session_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ParleyError::Validation("session_id is required".into()))?;
        let message = self
            .message
            .ok_or_else(|| ParleyError::Validation("message is required".into()))?;
        Ok((session_id, message))
    }
}

/// Handle WebSocket upgrade request.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    state.metrics.record_ws_connection();
    let conn_id = uuid::Uuid::new_v4();
    info!("WebSocket connected: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let reply = process_frame(text.as_str(), &state).await;
                if sender
                    .send(Message::Text(reply.to_string().into()))
                    .await
                    .is_err()
                {
                    debug!("WebSocket {} went away mid-reply", conn_id);
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!("WebSocket {} read error: {}", conn_id, e);
                break;
            }
            // Ping/pong are answered by the protocol layer.
            _ => {}
        }
    }

    info!("WebSocket disconnected: {}", conn_id);
}

/// Turn one text frame into the reply frame.
async fn process_frame(text: &str, state: &SharedState) -> serde_json::Value {
    let parsed = serde_json::from_str::<ClientFrame>(text)
        .map_err(ParleyError::from)
        .and_then(ClientFrame::validate);

    match parsed {
        Ok((session_id, message)) => {
            let outcome = state.chat.handle_turn_detailed(&session_id, &message).await;
            state.metrics.record_turn(outcome.fallback);
            json!({ "response": outcome.reply })
        }
        Err(e) => {
            warn!("Rejected socket frame: {}", e);
            state.metrics.record_validation_error();
            json!({ "error": e.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> Result<(String, String)> {
        serde_json::from_str::<ClientFrame>(text)
            .map_err(ParleyError::from)
            .and_then(ClientFrame::validate)
    }

    #[test]
    fn test_valid_frame() {
        let (sid, msg) = frame(r#"{"session_id":"s1","message":"hi"}"#).unwrap();
        assert_eq!((sid.as_str(), msg.as_str()), ("s1", "hi"));
    }

    #[test]
    fn test_missing_fields() {
        let err = frame(r#"{"message":"hi"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: session_id is required");

        let err = frame(r#"{"session_id":"s1"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: message is required");
    }

    #[test]
    fn test_blank_session_id_rejected() {
        assert!(frame(r#"{"session_id":"  ","message":"hi"}"#).is_err());
    }

    #[test]
    fn test_empty_message_allowed() {
        assert!(frame(r#"{"session_id":"s1","message":""}"#).is_ok());
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(frame("hello?"), Err(ParleyError::Json(_))));
    }
}
