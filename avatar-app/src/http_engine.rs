//! JSON-over-HTTP adapter for the synthesis engine service.

use async_trait::async_trait;
use avatar_runtime::{
    EngineError, EngineHandle, EngineSession, LocalEngineParams, RemoteEngineParams,
    SynthesisEngine,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Serialize)]
struct LocalSessionRequest<'a> {
    #[serde(flatten)]
    params: &'a LocalEngineParams,
}

#[derive(Serialize)]
struct RemoteSessionRequest<'a> {
    engine_model: &'static str,
    #[serde(flatten)]
    params: &'a RemoteEngineParams,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Target {
    Local,
    Remote,
}

pub struct HttpEngine {
    client: reqwest::Client,
    remote_base: String,
    local_base: String,
}

impl HttpEngine {
    pub fn new(remote_base: String, local_base: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            remote_base: remote_base.trim_end_matches('/').to_string(),
            local_base: local_base.trim_end_matches('/').to_string(),
        }
    }

    async fn open_session<B: Serialize + ?Sized>(
        &self,
        target: Target,
        base: &str,
        secret: &str,
        body: &B,
    ) -> Result<EngineHandle, EngineError> {
        let url = format!("{}/sessions", base);
        debug!(url = %url, "Opening engine session");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", secret))
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, target, &body));
        }

        let created: SessionCreated = response
            .json()
            .await
            .map_err(|e| EngineError::other(format!("Failed to parse session response: {}", e)))?;

        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            url: format!("{}/{}", url, created.session_id),
            secret: secret.to_string(),
            id: created.session_id,
        }))
    }
}

#[async_trait]
impl SynthesisEngine for HttpEngine {
    async fn create_local(
        &self,
        params: &LocalEngineParams,
        secret: &str,
    ) -> Result<EngineHandle, EngineError> {
        let base = format!("{}/local", self.local_base);
        self.open_session(Target::Local, &base, secret, &LocalSessionRequest { params })
            .await
    }

    async fn create_remote(
        &self,
        secret: &str,
        params: &RemoteEngineParams,
    ) -> Result<EngineHandle, EngineError> {
        let request = RemoteSessionRequest {
            engine_model: params.model.engine_model(),
            params,
        };
        self.open_session(Target::Remote, &self.remote_base, secret, &request)
            .await
    }
}

struct HttpSession {
    client: reqwest::Client,
    url: String,
    secret: String,
    id: String,
}

#[async_trait]
impl EngineSession for HttpSession {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        let response = self
            .client
            .delete(&self.url)
            .header("Authorization", format!("Bearer {}", self.secret))
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            status => Err(status_error(status, Target::Remote, "session teardown rejected")),
        }
    }
}

fn request_error(e: reqwest::Error) -> EngineError {
    if e.is_connect() || e.is_timeout() {
        EngineError::network(format!("Network connection failed: {}", e))
    } else {
        EngineError::other(format!("HTTP request failed: {}", e))
    }
}

fn status_error(status: StatusCode, target: Target, body: &str) -> EngineError {
    match status.as_u16() {
        401 | 403 => EngineError::auth(format!("{}: {}", status, body)),
        404 if target == Target::Local => EngineError::asset(format!("Asset not found: {}", body)),
        500..=599 => EngineError::network(format!("Server error {}: {}", status, body)),
        _ => EngineError::other(format!("HTTP error {}: {}", status, body)),
    }
}
