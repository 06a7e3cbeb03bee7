// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the orchestration engine.

use orc_adapters::AdapterError;
use orc_core::ErrorKind;
use orc_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    #[error("invalid state for session {session_id}: {reason}")]
    InvalidState { session_id: String, reason: String },
    #[error("invalid transition for session {session_id}: {from} -> {to}")]
    InvalidTransition {
        session_id: String,
        from: String,
        to: String,
    },
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("spawn failed: {0}")]
    SpawnFailure(#[from] AdapterError),
    #[error("{0}")]
    ParseFailure(String),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("task store error: {0}")]
    Store(#[from] StoreError),
    #[error("assignment conflict for task {0}")]
    Conflict(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::SessionNotFound(_) | EngineError::AgentNotFound(_) => ErrorKind::NotFound,
            EngineError::InvalidState { .. } => ErrorKind::InvalidState,
            EngineError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            EngineError::Timeout(_) => ErrorKind::Timeout,
            EngineError::SpawnFailure(_) => ErrorKind::SpawnFailure,
            EngineError::ParseFailure(_) => ErrorKind::ParseFailure,
            EngineError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            EngineError::Store(e) => e.kind(),
            EngineError::Conflict(_) => ErrorKind::Conflict,
        }
    }
}
