// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP client for `orcd`'s external API. Unlike the teacher's
//! `DaemonClient` (a Unix-socket IPC client that can also auto-start and
//! restart the daemon), this client only ever connects — `orcd` is expected
//! to already be running under its own supervision (systemd, a container
//! orchestrator), not spawned on demand by the CLI.

use orc_core::ErrorKind;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach orcd at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{message}")]
    Daemon { kind: ErrorKind, message: String },
    #[error("unexpected response from orcd: {0}")]
    UnexpectedResponse(reqwest::Error),
}

impl ClientError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Unreachable { .. } | ClientError::UnexpectedResponse(_) => 1,
            ClientError::Daemon { kind, .. } => kind.exit_code(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorKind,
    message: String,
}

pub struct DaemonClient {
    http: reqwest::Client,
    base_url: String,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn start_agent(
        &self,
        agent_id: &str,
        initial_prompt: Option<String>,
        resume: bool,
    ) -> Result<String, ClientError> {
        let body = serde_json::json!({ "initial_prompt": initial_prompt, "resume": resume });
        let value = self
            .post(&format!("/agents/{agent_id}/start"), &body)
            .await?;
        Ok(value["session_id"].as_str().unwrap_or_default().to_string())
    }

    pub async fn stop_agent(&self, agent_id: &str, graceful: bool) -> Result<(), ClientError> {
        let body = serde_json::json!({ "graceful": graceful });
        self.post(&format!("/agents/{agent_id}/stop"), &body).await?;
        Ok(())
    }

    pub async fn message_agent(&self, agent_id: &str, content: &str) -> Result<(), ClientError> {
        let body = serde_json::json!({ "content": content });
        self.post(&format!("/agents/{agent_id}/message"), &body).await?;
        Ok(())
    }

    pub async fn suspend_agent(&self, agent_id: &str) -> Result<(), ClientError> {
        self.post(&format!("/agents/{agent_id}/suspend"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn dispatch_poll_now(&self) -> Result<serde_json::Value, ClientError> {
        self.post("/dispatch/poll-now", &serde_json::json!({})).await
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Unreachable { url: url.clone(), source })?;

        if resp.status().is_success() {
            resp.json().await.map_err(ClientError::UnexpectedResponse)
        } else {
            let body: ErrorBody = resp.json().await.map_err(ClientError::UnexpectedResponse)?;
            Err(ClientError::Daemon {
                kind: body.error,
                message: body.message,
            })
        }
    }
}
