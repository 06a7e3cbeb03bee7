// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::{SkillSet, TaskId, TaskOrchestratorMeta};
use orc_store::{AssignMeta, InMemoryTaskStore};

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
async fn empty_queue_reports_no_next_task() {
    let store = InMemoryTaskStore::new();
    let result = check_ready_queue(&store, &AgentId::from("agent-1"), ReadyQueueOptions::default())
        .await
        .unwrap();
    assert!(result.next_task.is_none());
    assert_eq!(result.queue_depth, 0);
    assert!(!result.should_auto_start);
}

#[tokio::test]
async fn reports_the_highest_priority_task_first() {
    let store = InMemoryTaskStore::new();
    store.seed_task(task("low", 5), TaskStatus::Open, false);
    store.seed_task(task("high", 1), TaskStatus::Open, false);
    let agent = AgentId::from("agent-1");
    store
        .assign_task_atomic(&TaskId::from("low"), &agent, AssignMeta::default())
        .await
        .unwrap();
    store
        .assign_task_atomic(&TaskId::from("high"), &agent, AssignMeta::default())
        .await
        .unwrap();

    let result = check_ready_queue(&store, &agent, ReadyQueueOptions::default())
        .await
        .unwrap();
    assert_eq!(result.next_task.unwrap().task_id.as_str(), "high");
    assert_eq!(result.queue_depth, 2);
}

#[tokio::test]
async fn auto_start_flag_only_set_when_work_is_found() {
    let store = InMemoryTaskStore::new();
    let agent = AgentId::from("agent-1");
    let options = ReadyQueueOptions {
        auto_start: true,
        limit: 5,
    };

    let empty = check_ready_queue(&store, &agent, options).await.unwrap();
    assert!(!empty.should_auto_start);

    store.seed_task(task("t1", 1), TaskStatus::Open, false);
    store
        .assign_task_atomic(&TaskId::from("t1"), &agent, AssignMeta::default())
        .await
        .unwrap();
    let found = check_ready_queue(&store, &agent, options).await.unwrap();
    assert!(found.should_auto_start);
}

#[tokio::test]
async fn limit_caps_the_reported_queue_depth() {
    let store = InMemoryTaskStore::new();
    let agent = AgentId::from("agent-1");
    for i in 0..5 {
        let id = format!("t{i}");
        store.seed_task(task(&id, i as i64), TaskStatus::Open, false);
        store
            .assign_task_atomic(&TaskId::from(id.as_str()), &agent, AssignMeta::default())
            .await
            .unwrap();
    }
    let options = ReadyQueueOptions {
        auto_start: false,
        limit: 2,
    };
    let result = check_ready_queue(&store, &agent, options).await.unwrap();
    assert_eq!(result.queue_depth, 2);
}
