// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn entry(created_at_ms: u64, status: SessionStatus, upstream: Option<&str>) -> SessionHistoryEntry {
    SessionHistoryEntry {
        session_id: SessionId::new(format!("s-{created_at_ms}")),
        agent_id: AgentId::new("a-1"),
        role: AgentRole::Worker,
        status,
        working_dir: "/tmp".into(),
        created_at_ms,
        started_at_ms: None,
        ended_at_ms: None,
        upstream_session_id: upstream.map(str::to_string),
    }
}

#[test]
fn resumable_requires_upstream_id_and_terminal_ish_status() {
    assert!(entry(1, SessionStatus::Suspended, Some("u")).is_resumable());
    assert!(entry(1, SessionStatus::Terminated, Some("u")).is_resumable());
    assert!(!entry(1, SessionStatus::Terminated, None).is_resumable());
    assert!(!entry(1, SessionStatus::Running, Some("u")).is_resumable());
}

#[test]
fn most_recent_resumable_picks_newest_regardless_of_input_order() {
    let entries = vec![
        entry(100, SessionStatus::Terminated, Some("u-old")),
        entry(300, SessionStatus::Suspended, Some("u-new")),
        entry(200, SessionStatus::Terminated, Some("u-mid")),
    ];
    let found = most_recent_resumable(&entries).unwrap();
    assert_eq!(found.upstream_session_id.as_deref(), Some("u-new"));
}

#[test]
fn most_recent_resumable_ignores_non_resumable_entries() {
    let entries = vec![
        entry(500, SessionStatus::Running, Some("u-running")),
        entry(100, SessionStatus::Terminated, Some("u-done")),
    ];
    let found = most_recent_resumable(&entries).unwrap();
    assert_eq!(found.upstream_session_id.as_deref(), Some("u-done"));
}

#[test]
fn most_recent_resumable_empty_when_none_qualify() {
    let entries = vec![entry(1, SessionStatus::Running, None)];
    assert!(most_recent_resumable(&entries).is_none());
}
