// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier and the shapes the core reads from the external task store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for a task in the external task store.
    pub struct TaskId;
}

/// A normalized skill/language token: lowercased and trimmed.
///
/// Constructing via [`Skill::new`] is the only way to get one, so every
/// `Skill` in memory is already normalized — set operations never need to
/// re-normalize.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skill(String);

impl Skill {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Skill {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Skill {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Capability/requirement bundle shared by tasks and agents: a pair of sets
/// (skills, languages), always stored normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    pub skills: BTreeSet<Skill>,
    pub languages: BTreeSet<Skill>,
}

impl SkillSet {
    pub fn new(
        skills: impl IntoIterator<Item = impl Into<Skill>>,
        languages: impl IntoIterator<Item = impl Into<Skill>>,
    ) -> Self {
        Self {
            skills: skills.into_iter().map(Into::into).collect(),
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.languages.is_empty()
    }
}

/// A ready task's capability requirements as reported by
/// `get_ready_tasks`: status = open, unblocked, unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignmentSnapshot {
    pub task_id: TaskId,
    pub priority: i64,
    pub created_at_ms: u64,
    pub required: SkillSet,
    pub preferred: SkillSet,
    #[serde(default)]
    pub orchestrator_meta: TaskOrchestratorMeta,
}

/// Orchestrator-owned metadata stored on the task record.
///
/// The core never reads these fields back to make scheduling decisions —
/// they are write-only bookkeeping the dashboards and CLI read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOrchestratorMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_request_url: Option<String>,
    #[serde(default)]
    pub handoff_history: Vec<HandoffEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffEntry {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<String>,
    pub handoff_at_ms: u64,
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
