//! HTTP client for a running relay — what the terminal chat talks to.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{anyhow, bail};
use reqwest::{Client, Response, Url};

use parley_core::message::Turn;
use parley_hub::api::{ChatRequest, ChatResponse, HistoryResponse, SessionsResponse};

/// Relay address used when none is given.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8000";

/// Extra wait on top of the relay's backend timeout. The relay answers with
/// a fallback once its own bound expires, and the client must still be
/// listening then.
pub const REPLY_MARGIN: Duration = Duration::from_secs(30);

/// Client-side bound for a relay that abandons backend calls after
/// `backend_timeout`.
pub fn request_timeout(backend_timeout: Duration) -> Duration {
    backend_timeout + REPLY_MARGIN
}

pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one message and return the relay's reply.
    pub async fn send(&self, session_id: &str, message: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            session_id: session_id.to_string(),
            message: message.to_string(),
        };
        let resp = self
            .client
            .post(self.url("/chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.describe(e))?;

        let chat: ChatResponse = check(resp).await?.json().await?;
        Ok(chat.response)
    }

    pub async fn history(&self, session_id: &str) -> anyhow::Result<Vec<Turn>> {
        let resp = self
            .client
            .get(self.session_url(session_id)?)
            .send()
            .await
            .map_err(|e| self.describe(e))?;

        let history: HistoryResponse = check(resp).await?.json().await?;
        Ok(history.turns)
    }

    pub async fn sessions(&self) -> anyhow::Result<BTreeSet<String>> {
        let resp = self
            .client
            .get(self.url("/sessions"))
            .send()
            .await
            .map_err(|e| self.describe(e))?;

        let sessions: SessionsResponse = check(resp).await?.json().await?;
        Ok(sessions.sessions)
    }

    pub async fn clear(&self, session_id: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .delete(self.session_url(session_id)?)
            .send()
            .await
            .map_err(|e| self.describe(e))?;

        check(resp).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/sessions/{id}` with the id percent-encoded as one path segment.
    fn session_url(&self, session_id: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.url("/sessions"))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Relay URL cannot be a base: {}", self.base_url))?
            .push(session_id);
        Ok(url)
    }

    fn describe(&self, e: reqwest::Error) -> anyhow::Error {
        if e.is_timeout() {
            anyhow!("Request timed out.")
        } else if e.is_connect() {
            anyhow!(
                "Cannot connect to the relay at {}. Make sure `parley serve` is running.",
                self.base_url
            )
        } else {
            anyhow::Error::new(e).context("Request failed")
        }
    }
}

async fn check(resp: Response) -> anyhow::Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail: String = body.chars().take(200).collect();
    bail!("Server returned {}: {}", status, detail)
}
