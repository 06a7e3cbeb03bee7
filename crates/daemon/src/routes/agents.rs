// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/agents/:id/*` — start, stop, message, and per-session stream.
//!
//! The external API only ever names an agent, never a session directly
//! (sessions are an internal detail); every route here resolves the
//! agent's current or most recent session through
//! [`orc_engine::SessionManager::session_for_agent`] before acting.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{Stream, StreamExt};
use orc_adapters::{AgentProvider, HeadlessSpawnOpts};
use orc_core::{AgentId, AgentRole};
use orc_engine::{EngineError, StartOptions};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct StartRequest {
    #[serde(default)]
    pub initial_prompt: Option<String>,
    #[serde(default)]
    pub resume: bool,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: String,
}

pub async fn start<P: AgentProvider>(
    State(state): State<AppState<P>>,
    Path(agent_id): Path<String>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let agent_id = AgentId::from(agent_id);
    let role = resolve_role(&state, &agent_id).await?;
    let options = build_start_options(&state, &agent_id, req.initial_prompt);

    let session_id = if req.resume {
        state.manager.resume(agent_id, role, options).await?
    } else {
        state.manager.start(agent_id, role, options).await?
    };

    Ok(Json(StartResponse {
        session_id: session_id.as_str().to_string(),
    }))
}

#[derive(Debug, Deserialize, Default)]
pub struct StopRequest {
    #[serde(default)]
    pub graceful: bool,
}

pub async fn stop<P: AgentProvider>(
    State(state): State<AppState<P>>,
    Path(agent_id): Path<String>,
    Json(req): Json<StopRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let agent_id = AgentId::from(agent_id);
    let session_id = state
        .manager
        .session_for_agent(&agent_id)
        .ok_or_else(|| EngineError::AgentNotFound(agent_id.as_str().to_string()))?;
    state.manager.stop(&session_id, req.graceful).await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn suspend<P: AgentProvider>(
    State(state): State<AppState<P>>,
    Path(agent_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let agent_id = AgentId::from(agent_id);
    let session_id = state
        .manager
        .session_for_agent(&agent_id)
        .ok_or_else(|| EngineError::AgentNotFound(agent_id.as_str().to_string()))?;
    state.manager.suspend(&session_id).await?;
    Ok(Json(serde_json::json!({})))
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

pub async fn message<P: AgentProvider>(
    State(state): State<AppState<P>>,
    Path(agent_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let agent_id = AgentId::from(agent_id);
    let session_id = state
        .manager
        .session_for_agent(&agent_id)
        .ok_or_else(|| EngineError::AgentNotFound(agent_id.as_str().to_string()))?;
    let payload = serde_json::json!({
        "type": "user",
        "message": {"role": "user", "content": req.content},
    });
    state.manager.send(&session_id, payload).await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn stream<P: AgentProvider>(
    State(state): State<AppState<P>>,
    Path(agent_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>>, ApiError> {
    let agent_id = AgentId::from(agent_id);
    let session_id = state
        .manager
        .session_for_agent(&agent_id)
        .ok_or_else(|| EngineError::AgentNotFound(agent_id.as_str().to_string()))?;

    let events = state.manager.stream(&session_id).map(|event| {
        let event_name = event_kind_name(&event.kind);
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(event_name).data(data))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn event_kind_name(kind: &orc_core::SessionEventKind) -> &'static str {
    use orc_core::SessionEventKind::*;
    match kind {
        System => "system",
        Assistant => "assistant",
        User => "user",
        ToolUse => "tool_use",
        ToolResult => "tool_result",
        Result => "result",
        Error => "error",
        Raw => "raw",
    }
}

async fn resolve_role<P: AgentProvider>(state: &AppState<P>, agent_id: &AgentId) -> Result<AgentRole, ApiError> {
    let record = state
        .store
        .get_agent(agent_id)
        .await
        .map_err(EngineError::from)?;
    match record {
        Some(record) => Ok(record.agent_role),
        None => Err(EngineError::AgentNotFound(agent_id.as_str().to_string()).into()),
    }
}

fn build_start_options<P: AgentProvider>(
    state: &AppState<P>,
    agent_id: &AgentId,
    initial_prompt: Option<String>,
) -> StartOptions {
    let mut env = HashMap::new();
    env.insert(
        "ELEMENTAL_ROOT".to_string(),
        state.config.workspace_root.display().to_string(),
    );
    env.insert("ELEMENTAL_SESSION_ID".to_string(), agent_id.as_str().to_string());

    let opts = HeadlessSpawnOpts {
        cwd: state.config.workspace_root.clone(),
        env,
        resume_session_id: None,
    };

    let initial_turn = serde_json::json!({
        "type": "user",
        "message": {"role": "user", "content": initial_prompt.unwrap_or_default()},
    });

    StartOptions::Headless { opts, initial_turn }
}
