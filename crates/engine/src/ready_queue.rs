// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ready-queue check: lets an agent ask "is there work waiting for me"
//! without the orchestrator itself deciding to start it.

use orc_core::{AgentId, TaskAssignmentSnapshot};
use orc_store::{StoreError, TaskStatus, TaskStore};

#[derive(Debug, Clone, Copy)]
pub struct ReadyQueueOptions {
    /// If true and a task is found, the result's `should_auto_start` flag is
    /// set; the caller, not this check, is responsible for invoking the
    /// store's "start task" operation.
    pub auto_start: bool,
    pub limit: usize,
}

impl Default for ReadyQueueOptions {
    fn default() -> Self {
        Self {
            auto_start: false,
            limit: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadyQueueResult {
    pub next_task: Option<TaskAssignmentSnapshot>,
    pub queue_depth: usize,
    pub should_auto_start: bool,
}

/// Top-K tasks already assigned to `agent_id` in `{open, in_progress}`,
/// ordered by priority. Never mutates task state, even when `auto_start` is
/// set — that flag only tells the caller whether it should invoke the
/// store's own start-task operation.
pub async fn check_ready_queue(
    store: &dyn TaskStore,
    agent_id: &AgentId,
    options: ReadyQueueOptions,
) -> Result<ReadyQueueResult, StoreError> {
    let tasks = store
        .get_tasks_for_agent(
            agent_id,
            &[TaskStatus::Open, TaskStatus::InProgress],
            options.limit.max(1),
        )
        .await?;
    let next_task = tasks.first().cloned();
    let should_auto_start = options.auto_start && next_task.is_some();
    Ok(ReadyQueueResult {
        queue_depth: tasks.len(),
        should_auto_start,
        next_task,
    })
}

#[cfg(test)]
#[path = "ready_queue_tests.rs"]
mod tests;
