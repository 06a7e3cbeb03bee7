// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::EventBusConfig;
use orc_adapters::FakeProvider;
use orc_core::FakeClock;
use std::collections::HashMap;
use std::time::Duration;

fn headless_opts() -> HeadlessSpawnOpts {
    HeadlessSpawnOpts {
        cwd: PathBuf::from("."),
        env: HashMap::new(),
        resume_session_id: None,
    }
}

fn interactive_opts() -> InteractiveSpawnOpts {
    InteractiveSpawnOpts {
        cwd: PathBuf::from("."),
        env: HashMap::new(),
        dimensions: PtyDimensions::default(),
        resume_session_id: None,
    }
}

fn new_id() -> SessionId {
    SessionId::new(uuid::Uuid::new_v4().to_string())
}

fn spawner(provider: FakeProvider) -> Spawner<FakeProvider, FakeClock> {
    spawner_with_clock(provider, FakeClock::new(0))
}

fn spawner_with_clock(provider: FakeProvider, clock: FakeClock) -> Spawner<FakeProvider, FakeClock> {
    let bus = Arc::new(EventBus::new(clock.clone(), EventBusConfig::default()));
    Spawner::new(Arc::new(provider), bus, clock, SpawnerConfig::default())
}

#[tokio::test]
async fn headless_init_handshake_records_upstream_id_and_runs() {
    let spawner = spawner(FakeProvider::new("fake"));
    let initial = serde_json::json!({"type": "system", "subtype": "init", "session_id": "up-1"});
    let session_id = spawner
        .start_headless(new_id(), AgentId::from("agent-1"), headless_opts(), initial)
        .await
        .unwrap();
    assert_eq!(spawner.status(&session_id), Some(SessionStatus::Running));
    assert_eq!(spawner.upstream_session_id(&session_id), Some("up-1".to_string()));
}

#[tokio::test(start_paused = true)]
async fn headless_handshake_times_out_and_terminates() {
    let spawner = Arc::new(spawner(FakeProvider::new("fake")));
    let non_init = serde_json::json!({"type": "assistant"});
    let id = new_id();
    let task = {
        let spawner = spawner.clone();
        let id = id.clone();
        tokio::spawn(async move {
            spawner
                .start_headless(id, AgentId::from("agent-1"), headless_opts(), non_init)
                .await
        })
    };
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(130)).await;
    let result = task.await.unwrap();
    assert!(matches!(result, Err(EngineError::Timeout(_))));
    assert_eq!(spawner.status(&id), Some(SessionStatus::Terminated));
}

#[tokio::test]
async fn start_interactive_is_immediately_running_with_no_handshake() {
    let spawner = spawner(FakeProvider::new("fake"));
    let session_id = spawner
        .start_interactive(new_id(), AgentId::from("agent-1"), interactive_opts())
        .await
        .unwrap();
    assert_eq!(spawner.status(&session_id), Some(SessionStatus::Running));
}

#[tokio::test]
async fn send_input_on_interactive_session_is_rejected() {
    let spawner = spawner(FakeProvider::new("fake"));
    let session_id = spawner
        .start_interactive(new_id(), AgentId::from("agent-1"), interactive_opts())
        .await
        .unwrap();
    let err = spawner
        .send_input(&session_id, serde_json::json!({"type": "user"}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn write_pty_on_headless_session_is_rejected() {
    let spawner = spawner(FakeProvider::new("fake"));
    let initial = serde_json::json!({"type": "system", "subtype": "init", "session_id": "up-1"});
    let session_id = spawner
        .start_headless(new_id(), AgentId::from("agent-1"), headless_opts(), initial)
        .await
        .unwrap();
    let err = spawner.write_pty(&session_id, b"hi".to_vec()).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn resize_pty_on_headless_session_is_rejected() {
    let spawner = spawner(FakeProvider::new("fake"));
    let initial = serde_json::json!({"type": "system", "subtype": "init", "session_id": "up-1"});
    let session_id = spawner
        .start_headless(new_id(), AgentId::from("agent-1"), headless_opts(), initial)
        .await
        .unwrap();
    let err = spawner
        .resize_pty(&session_id, PtyDimensions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn terminate_is_idempotent() {
    let spawner = spawner(FakeProvider::new("fake"));
    let session_id = spawner
        .start_interactive(new_id(), AgentId::from("agent-1"), interactive_opts())
        .await
        .unwrap();
    spawner.terminate(&session_id, false).await.unwrap();
    assert_eq!(spawner.status(&session_id), Some(SessionStatus::Terminated));
    // Second terminate on an already-terminated session is a no-op, not an error.
    spawner.terminate(&session_id, false).await.unwrap();
}

#[tokio::test]
async fn suspend_keeps_the_record_and_upstream_id() {
    let spawner = spawner(FakeProvider::new("fake"));
    let initial = serde_json::json!({"type": "system", "subtype": "init", "session_id": "up-9"});
    let session_id = spawner
        .start_headless(new_id(), AgentId::from("agent-1"), headless_opts(), initial)
        .await
        .unwrap();
    spawner.suspend(&session_id).await.unwrap();
    assert_eq!(spawner.status(&session_id), Some(SessionStatus::Suspended));
    assert_eq!(spawner.upstream_session_id(&session_id), Some("up-9".to_string()));
}

#[tokio::test]
async fn list_active_excludes_terminated_sessions() {
    let spawner = spawner(FakeProvider::new("fake"));
    let a = spawner
        .start_interactive(new_id(), AgentId::from("agent-1"), interactive_opts())
        .await
        .unwrap();
    let b = spawner
        .start_interactive(new_id(), AgentId::from("agent-1"), interactive_opts())
        .await
        .unwrap();
    spawner.terminate(&a, false).await.unwrap();
    let active = spawner.list_active();
    assert!(!active.contains(&a));
    assert!(active.contains(&b));
    assert_eq!(spawner.list_all().len(), 2);
}

#[tokio::test]
async fn most_recent_for_agent_picks_the_latest_session() {
    let clock = FakeClock::new(0);
    let spawner = spawner_with_clock(FakeProvider::new("fake"), clock.clone());
    let agent = AgentId::from("agent-1");
    let first = spawner
        .start_interactive(new_id(), agent.clone(), interactive_opts())
        .await
        .unwrap();
    clock.advance_ms(1_000);
    let second = spawner
        .start_interactive(new_id(), agent.clone(), interactive_opts())
        .await
        .unwrap();
    assert_ne!(first, second);
    let most_recent = spawner.most_recent_for_agent(&agent).unwrap();
    assert_eq!(most_recent, second);
}
