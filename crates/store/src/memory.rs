// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `TaskStore`. Used as the reference implementation for tests
//! and as the daemon's default store when no external one is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use orc_core::{AgentId, AgentRecord, TaskAssignmentSnapshot, TaskId};
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::types::{
    AgentSessionUpdate, AssignMeta, AssignOutcome, IdleWorker, TaskOrchestratorMetaPatch,
    TaskStatus,
};
use crate::TaskStore;

struct StoredTask {
    snapshot: TaskAssignmentSnapshot,
    status: TaskStatus,
    blocked: bool,
    assignee: Option<AgentId>,
}

struct StoredAgent {
    record: AgentRecord,
    name: String,
    currently_assigned_count: u32,
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskId, StoredTask>,
    agents: HashMap<AgentId, StoredAgent>,
}

/// A plain, process-local `TaskStore`. Every call is synchronous under the
/// hood but still `async fn` to satisfy the trait, matching a real
/// network-backed implementation's shape.
#[derive(Default)]
pub struct InMemoryTaskStore {
    inner: Mutex<Inner>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_task(&self, snapshot: TaskAssignmentSnapshot, status: TaskStatus, blocked: bool) {
        let mut inner = self.inner.lock();
        inner.tasks.insert(
            snapshot.task_id.clone(),
            StoredTask {
                snapshot,
                status,
                blocked,
                assignee: None,
            },
        );
    }

    pub fn seed_agent(&self, agent_id: AgentId, name: impl Into<String>, record: AgentRecord) {
        let mut inner = self.inner.lock();
        inner.agents.insert(
            agent_id,
            StoredAgent {
                record,
                name: name.into(),
                currently_assigned_count: 0,
            },
        );
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get_ready_tasks(
        &self,
        limit: usize,
    ) -> Result<Vec<TaskAssignmentSnapshot>, StoreError> {
        let inner = self.inner.lock();
        let mut ready: Vec<&StoredTask> = inner
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Open && !t.blocked && t.assignee.is_none())
            .collect();
        ready.sort_by(|a, b| {
            a.snapshot
                .priority
                .cmp(&b.snapshot.priority)
                .then(a.snapshot.created_at_ms.cmp(&b.snapshot.created_at_ms))
        });
        Ok(ready
            .into_iter()
            .take(limit)
            .map(|t| t.snapshot.clone())
            .collect())
    }

    async fn get_tasks_for_agent(
        &self,
        agent_id: &AgentId,
        statuses: &[TaskStatus],
        limit: usize,
    ) -> Result<Vec<TaskAssignmentSnapshot>, StoreError> {
        let inner = self.inner.lock();
        let mut assigned: Vec<&StoredTask> = inner
            .tasks
            .values()
            .filter(|t| t.assignee.as_ref() == Some(agent_id) && statuses.contains(&t.status))
            .collect();
        assigned.sort_by(|a, b| {
            a.snapshot
                .priority
                .cmp(&b.snapshot.priority)
                .then(a.snapshot.created_at_ms.cmp(&b.snapshot.created_at_ms))
        });
        Ok(assigned
            .into_iter()
            .take(limit)
            .map(|t| t.snapshot.clone())
            .collect())
    }

    async fn get_idle_workers(&self) -> Result<Vec<IdleWorker>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .agents
            .iter()
            .filter(|(_, a)| {
                a.record.agent_role == orc_core::AgentRole::Worker
                    && a.record.session_status != orc_core::SessionStatus::Running
            })
            .map(|(id, a)| IdleWorker {
                agent_id: id.clone(),
                name: a.name.clone(),
                capabilities: a.record.capabilities.clone(),
                currently_assigned_count: a.currently_assigned_count,
            })
            .collect())
    }

    async fn assign_task_atomic(
        &self,
        task_id: &TaskId,
        agent_id: &AgentId,
        meta: AssignMeta,
    ) -> Result<AssignOutcome, StoreError> {
        let mut inner = self.inner.lock();
        let task = inner
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.as_str().to_string()))?;
        if task.assignee.is_some() {
            return Ok(AssignOutcome::Conflict);
        }
        task.assignee = Some(agent_id.clone());
        let _ = meta;
        if let Some(agent) = inner.agents.get_mut(agent_id) {
            agent.currently_assigned_count += 1;
        }
        Ok(AssignOutcome::Ok)
    }

    async fn update_agent_session(
        &self,
        agent_id: &AgentId,
        update: AgentSessionUpdate,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let agent = inner
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| StoreError::AgentNotFound(agent_id.as_str().to_string()))?;
        agent.record.session_status = update.status;
        agent.record.session_id = update.session_id;
        Ok(())
    }

    async fn update_task_orchestrator_meta(
        &self,
        task_id: &TaskId,
        patch: TaskOrchestratorMetaPatch,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let task = inner
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.as_str().to_string()))?;
        let meta = &mut task.snapshot.orchestrator_meta;
        if patch.branch.is_some() {
            meta.branch = patch.branch;
        }
        if patch.worktree.is_some() {
            meta.worktree = patch.worktree;
        }
        if patch.session_id.is_some() {
            meta.session_id = patch.session_id;
        }
        if patch.merge_status.is_some() {
            meta.merge_status = patch.merge_status;
        }
        if patch.merge_request_url.is_some() {
            meta.merge_request_url = patch.merge_request_url;
        }
        if let Some(entry) = patch.append_handoff {
            meta.handoff_history.push(entry);
        }
        Ok(())
    }

    async fn get_task(&self, task_id: &TaskId) -> Result<Option<TaskAssignmentSnapshot>, StoreError> {
        Ok(self
            .inner
            .lock()
            .tasks
            .get(task_id)
            .map(|t| t.snapshot.clone()))
    }

    async fn get_agent(&self, agent_id: &AgentId) -> Result<Option<AgentRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .agents
            .get(agent_id)
            .map(|a| a.record.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::{CapabilitySet, SkillSet, TaskOrchestratorMeta};

    fn task(id: &str, priority: i64) -> TaskAssignmentSnapshot {
        TaskAssignmentSnapshot {
            task_id: TaskId::from(id),
            priority,
            created_at_ms: 0,
            required: SkillSet::default(),
            preferred: SkillSet::default(),
            orchestrator_meta: TaskOrchestratorMeta::default(),
        }
    }

    #[tokio::test]
    async fn ready_tasks_exclude_blocked_and_assigned() {
        let store = InMemoryTaskStore::new();
        store.seed_task(task("t1", 1), TaskStatus::Open, false);
        store.seed_task(task("t2", 2), TaskStatus::Open, true);
        store.seed_task(task("t3", 0), TaskStatus::Done, false);
        let ready = store.get_ready_tasks(10).await.unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].task_id.as_str(), "t1");
    }

    #[tokio::test]
    async fn ready_tasks_ordered_by_priority_then_creation() {
        let store = InMemoryTaskStore::new();
        store.seed_task(task("low", 5), TaskStatus::Open, false);
        store.seed_task(task("high", 1), TaskStatus::Open, false);
        let ready = store.get_ready_tasks(10).await.unwrap();
        assert_eq!(ready[0].task_id.as_str(), "high");
        assert_eq!(ready[1].task_id.as_str(), "low");
    }

    #[tokio::test]
    async fn second_atomic_assignment_conflicts() {
        let store = InMemoryTaskStore::new();
        store.seed_task(task("t1", 1), TaskStatus::Open, false);
        let a = AgentId::from("agent-a");
        let b = AgentId::from("agent-b");
        let first = store
            .assign_task_atomic(&TaskId::from("t1"), &a, AssignMeta::default())
            .await
            .unwrap();
        let second = store
            .assign_task_atomic(&TaskId::from("t1"), &b, AssignMeta::default())
            .await
            .unwrap();
        assert_eq!(first, AssignOutcome::Ok);
        assert_eq!(second, AssignOutcome::Conflict);
    }

    #[tokio::test]
    async fn tasks_for_agent_filters_by_assignee_and_status() {
        let store = InMemoryTaskStore::new();
        store.seed_task(task("t1", 1), TaskStatus::Open, false);
        store.seed_task(task("t2", 2), TaskStatus::InProgress, false);
        store.seed_task(task("t3", 0), TaskStatus::Done, false);
        let agent = AgentId::from("agent-a");
        store
            .assign_task_atomic(&TaskId::from("t1"), &agent, AssignMeta::default())
            .await
            .unwrap();
        store
            .assign_task_atomic(&TaskId::from("t2"), &agent, AssignMeta::default())
            .await
            .unwrap();
        store
            .assign_task_atomic(&TaskId::from("t3"), &agent, AssignMeta::default())
            .await
            .unwrap();
        let tasks = store
            .get_tasks_for_agent(&agent, &[TaskStatus::Open, TaskStatus::InProgress], 10)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_id.as_str(), "t1");
        assert_eq!(tasks[1].task_id.as_str(), "t2");
    }

    #[tokio::test]
    async fn idle_workers_excludes_running_sessions() {
        let store = InMemoryTaskStore::new();
        let running = AgentRecord {
            agent_role: orc_core::AgentRole::Worker,
            worker_mode: None,
            steward_focus: None,
            session_status: orc_core::SessionStatus::Running,
            session_id: Some("s1".into()),
            capabilities: CapabilitySet {
                skills: SkillSet::default(),
                max_concurrent_tasks: 1,
            },
            max_concurrent_tasks: 1,
        };
        let idle = AgentRecord {
            session_status: orc_core::SessionStatus::Terminated,
            ..running.clone()
        };
        store.seed_agent(AgentId::from("busy"), "busy", running);
        store.seed_agent(AgentId::from("free"), "free", idle);
        let workers = store.get_idle_workers().await.unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].agent_id.as_str(), "free");
    }
}
