// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-store: the external task/agent store interface consumed by the
//! Dispatch Daemon and Session Manager, plus an in-memory reference
//! implementation.
//!
//! The orchestration core never owns task/agent persistence directly; it
//! reads and writes through [`TaskStore`]. Readiness (no unsatisfied
//! blockers, not yet assigned) is computed by the store — the engine
//! treats `get_ready_tasks` as a black box.

mod error;
mod memory;
mod types;

pub use error::StoreError;
pub use memory::InMemoryTaskStore;
pub use types::{
    AgentSessionUpdate, AssignMeta, AssignOutcome, IdleWorker, TaskOrchestratorMetaPatch,
    TaskStatus,
};

use async_trait::async_trait;
use orc_core::{AgentId, AgentRecord, TaskAssignmentSnapshot, TaskId};

#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn get_ready_tasks(
        &self,
        limit: usize,
    ) -> Result<Vec<TaskAssignmentSnapshot>, StoreError>;

    async fn get_idle_workers(&self) -> Result<Vec<IdleWorker>, StoreError>;

    /// Tasks currently assigned to `agent_id` whose status is one of
    /// `statuses`, ordered by priority ascending then creation time
    /// ascending, capped to `limit`. Backs the ready-queue check.
    async fn get_tasks_for_agent(
        &self,
        agent_id: &AgentId,
        statuses: &[TaskStatus],
        limit: usize,
    ) -> Result<Vec<TaskAssignmentSnapshot>, StoreError>;

    /// Single-row compare-and-swap: succeeds only if the task is currently
    /// unassigned.
    async fn assign_task_atomic(
        &self,
        task_id: &TaskId,
        agent_id: &AgentId,
        meta: AssignMeta,
    ) -> Result<AssignOutcome, StoreError>;

    async fn update_agent_session(
        &self,
        agent_id: &AgentId,
        update: AgentSessionUpdate,
    ) -> Result<(), StoreError>;

    async fn update_task_orchestrator_meta(
        &self,
        task_id: &TaskId,
        patch: TaskOrchestratorMetaPatch,
    ) -> Result<(), StoreError>;

    async fn get_task(&self, task_id: &TaskId) -> Result<Option<TaskAssignmentSnapshot>, StoreError>;

    async fn get_agent(&self, agent_id: &AgentId) -> Result<Option<AgentRecord>, StoreError>;
}
