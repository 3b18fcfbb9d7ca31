//! JSON-over-HTTP transport to a conversion engine server
//!
//! Routes:
//! - `POST   /v1/sessions`               → `{"session_id": n}`
//! - `POST   /v1/sessions/{id}/key`      → `EngineResponse`
//! - `POST   /v1/sessions/{id}/command`  → `EngineResponse`
//! - `DELETE /v1/sessions/{id}`
//!
//! A 404 on a session route means the server no longer knows the session.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use ureq::http::{Response, StatusCode};
use ureq::{Agent, Body};

use crate::config::settings::EngineSettings;
use crate::core::protocol::{EngineResponse, KeyRequest, SessionCommand, SessionCreated};
use crate::core::session::{ConversionEngine, SessionError, SessionId};

/// Blocking HTTP client for one engine endpoint
pub struct HttpEngine {
    agent: Agent,
    base: String,
    timeout: Duration,
}

impl HttpEngine {
    /// `endpoint` is the server's base URL, e.g. `http://127.0.0.1:7450`.
    /// Every request, connect included, must finish within `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base: endpoint.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(&settings.endpoint, Duration::from_millis(settings.timeout_ms))
    }

    pub fn endpoint(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/sessions{}", self.base, path)
    }

    fn transport_error(&self, e: ureq::Error) -> SessionError {
        match e {
            ureq::Error::Timeout(_) => SessionError::Timeout(self.timeout),
            other => SessionError::Transport(other.to_string()),
        }
    }

    /// Check the status, then decode the body
    fn decode<T: DeserializeOwned>(
        &self,
        session: Option<SessionId>,
        mut response: Response<Body>,
    ) -> Result<T, SessionError> {
        let status = response.status();
        if let Some(id) = session
            && status == StatusCode::NOT_FOUND
        {
            return Err(SessionError::SessionNotFound(id));
        }
        if !status.is_success() {
            return Err(SessionError::Protocol(format!("unexpected status {}", status)));
        }
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| SessionError::Protocol(e.to_string()))
    }
}

impl ConversionEngine for HttpEngine {
    fn create_session(&mut self) -> Result<SessionId, SessionError> {
        let response = self
            .agent
            .post(&self.url(""))
            .send_empty()
            .map_err(|e| self.transport_error(e))?;
        let created: SessionCreated = self.decode(None, response)?;
        debug!("created session {} at {}", created.session_id, self.base);
        Ok(created.session_id)
    }

    fn delete_session(&mut self, id: SessionId) -> Result<(), SessionError> {
        let response = self
            .agent
            .delete(&self.url(&format!("/{}", id)))
            .call()
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(SessionError::Protocol(format!("unexpected status {}", status)))
        }
    }

    fn send_key(
        &mut self,
        id: SessionId,
        request: &KeyRequest,
    ) -> Result<EngineResponse, SessionError> {
        let response = self
            .agent
            .post(&self.url(&format!("/{}/key", id)))
            .send_json(request)
            .map_err(|e| self.transport_error(e))?;
        self.decode(Some(id), response)
    }

    fn send_command(
        &mut self,
        id: SessionId,
        command: &SessionCommand,
    ) -> Result<EngineResponse, SessionError> {
        let response = self
            .agent
            .post(&self.url(&format!("/{}/command", id)))
            .send_json(command)
            .map_err(|e| self.transport_error(e))?;
        self.decode(Some(id), response)
    }
}
