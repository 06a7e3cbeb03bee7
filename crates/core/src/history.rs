// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-(agent, role) session history, used to find the most recent resumable
//! session.

use crate::agent::{AgentId, AgentRole};
use crate::session::SessionId;
use crate::status::SessionStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHistoryEntry {
    pub session_id: SessionId,
    pub agent_id: AgentId,
    pub role: AgentRole,
    pub status: SessionStatus,
    pub working_dir: PathBuf,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_session_id: Option<String>,
}

impl SessionHistoryEntry {
    /// A history entry is resumable when its upstream id is known and the
    /// session reached a resumable terminal-ish state.
    pub fn is_resumable(&self) -> bool {
        self.upstream_session_id.is_some()
            && matches!(self.status, SessionStatus::Suspended | SessionStatus::Terminated)
    }
}

/// Find the most recent resumable entry for (agent, role), newest first.
///
/// `entries` need not be pre-sorted; this scans for the maximum `created_at_ms`
/// among resumable entries rather than assuming order.
pub fn most_recent_resumable<'a>(
    entries: impl IntoIterator<Item = &'a SessionHistoryEntry>,
) -> Option<&'a SessionHistoryEntry> {
    entries
        .into_iter()
        .filter(|e| e.is_resumable())
        .max_by_key(|e| e.created_at_ms)
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
