// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent capability sets and task capability requirements.
//!
//! Pure data here; the scoring logic itself lives in `orc-engine::matcher`
//! so this crate stays free of matching policy.

use crate::agent::AgentId;
use crate::task::SkillSet;
use serde::{Deserialize, Serialize};

/// What an agent can do, plus how much of it at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub skills: SkillSet,
    pub max_concurrent_tasks: u32,
}

/// A task's capability requirements, split required vs. preferred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequirements {
    pub required: SkillSet,
    pub preferred: SkillSet,
}

impl TaskRequirements {
    pub fn is_unconstrained(&self) -> bool {
        self.required.is_empty()
    }
}

/// An idle worker candidate as reported by `get_idle_workers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCandidate {
    pub agent_id: AgentId,
    pub capabilities: CapabilitySet,
    pub currently_assigned_count: u32,
}
