//! Session lookup against the external auth service
//!
//! The caller's credentials are forwarded as-is; whatever user the service
//! returns becomes a [`SessionState`] handed to the guard for this request
//! only.

use academy_gate_lib::{SessionState, User};
use axum::http::{header, HeaderMap, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, ServerError};

/// Body of a successful session response: either the user itself or
/// `{"user": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SessionBody {
    Wrapped { user: User },
    Bare(User),
}

impl From<SessionBody> for User {
    fn from(body: SessionBody) -> Self {
        match body {
            SessionBody::Wrapped { user } | SessionBody::Bare(user) => user,
        }
    }
}

/// Client for the session service
#[derive(Debug, Clone)]
pub struct SessionClient {
    url: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl SessionClient {
    pub fn new(url: Option<String>, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            url,
            client,
            timeout,
        }
    }

    /// Resolve the session for a request carrying `headers`.
    ///
    /// Signed-out callers (no credentials, or rejected ones) resolve to
    /// `Absent`. Only an unreachable or failing service is an error.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<SessionState> {
        let Some(url) = &self.url else {
            return Ok(SessionState::Absent);
        };

        let authorization = headers.get(header::AUTHORIZATION);
        let cookie = headers.get(header::COOKIE);
        if authorization.is_none() && cookie.is_none() {
            return Ok(SessionState::Absent);
        }

        let mut request = self.client.get(url).timeout(self.timeout);
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value.clone());
        }
        if let Some(value) = cookie {
            request = request.header(header::COOKIE, value.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServerError::SessionUnavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let body: SessionBody = response.json().await.map_err(|e| {
                    ServerError::SessionUnavailable(format!("unreadable session response: {}", e))
                })?;
                Ok(SessionState::Resolved(body.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                tracing::debug!("Session service rejected credentials");
                Ok(SessionState::Absent)
            }
            status => Err(ServerError::SessionUnavailable(format!(
                "session service returned {}",
                status
            ))),
        }
    }
}
