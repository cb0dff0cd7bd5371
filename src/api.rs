// REST client for the draft authority's resource endpoints.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::protocol::{JoinRequest, Participant, Player};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (refused, DNS, timeout).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status. The message comes
    /// from the JSON error body when one is present.
    #[error("{message}")]
    Server { status: u16, message: String },
}

/// Thin client over the authority's HTTP resource endpoints. Cloning is
/// cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the full roster of draftable players for an event. One
    /// attempt, no retry — the caller owns retry cadence.
    pub async fn event_players(&self, event_id: i64) -> Result<Vec<Player>, ApiError> {
        self.get_json(&format!("/events/{event_id}/players")).await
    }

    /// Join a draft with a display name and passkey, returning the
    /// participant record the authority created.
    pub async fn join(&self, display_name: &str, passkey: &str) -> Result<Participant, ApiError> {
        let body = JoinRequest {
            display_name: display_name.to_string(),
            passkey: passkey.to_string(),
        };
        self.post_json("/events/join", &body).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        Self::decode_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let response = self.http.post(&url).json(body).send().await?;
        Self::decode_response(response).await
    }

    async fn decode_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }
        Ok(response.json().await?)
    }
}

/// Extract a human-readable message from an error response: the `error`
/// field of a JSON body when present, else a generic HTTP-status message.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"))
}
