// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier and role types.
//!
//! An `AgentId` identifies a logical agent in the external task store. It is
//! distinct from [`crate::session::SessionId`], which identifies one live or
//! historical subprocess run on behalf of an agent — an agent may be bound to
//! many sequential sessions over its lifetime (ephemeral workers), or to at
//! most one live session at a time (directors, stewards, persistent workers).

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for an agent instance.
    pub struct AgentId;
}

/// Role an agent plays within the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Director,
    Worker,
    Steward,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Director => write!(f, "director"),
            AgentRole::Worker => write!(f, "worker"),
            AgentRole::Steward => write!(f, "steward"),
        }
    }
}

/// Concurrency discipline for a worker agent.
///
/// Only meaningful for [`AgentRole::Worker`]; directors and stewards behave
/// like persistent workers (bound to at most one live session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerMode {
    /// A fresh session is spawned per task; the session ends when the task does.
    Ephemeral,
    /// The worker keeps one long-lived session across many tasks.
    Persistent,
}

/// Categorized failure reasons for an agent/session, surfaced on
/// [`crate::status::SessionStatus::Terminated`] and in [`crate::error::ErrorKind::SpawnFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentError {
    /// Invalid API key or authentication failure.
    Unauthorized,
    /// Exceeded quota or billing issue.
    OutOfCredits,
    /// Network connectivity issue.
    NoInternet,
    /// Rate limited by upstream API.
    RateLimited,
    /// Other error with message.
    Other(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Unauthorized => write!(f, "unauthorized"),
            AgentError::OutOfCredits => write!(f, "out of credits"),
            AgentError::NoInternet => write!(f, "no internet connection"),
            AgentError::RateLimited => write!(f, "rate limited"),
            AgentError::Other(msg) => write!(f, "{}", msg),
        }
    }
}
