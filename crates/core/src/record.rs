// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent record as stored on the external agent record —
//! what the Dispatch Daemon and Session Manager read/write through
//! [`crate::AgentId`] but never own directly.

use crate::agent::{AgentRole, WorkerMode};
use crate::capability::CapabilitySet;
use crate::status::SessionStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_role: AgentRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_mode: Option<WorkerMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steward_focus: Option<String>,
    pub session_status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub capabilities: CapabilitySet,
    pub max_concurrent_tasks: u32,
}
