// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn raw_event_carries_the_line_as_text() {
    let ev = SessionEvent::raw("not json", 5);
    assert_eq!(ev.kind, SessionEventKind::Raw);
    assert_eq!(ev.text.as_deref(), Some("not json"));
}

#[test]
fn terminal_event_is_a_result_kind() {
    let ev = SessionEvent::terminal(10);
    assert_eq!(ev.kind, SessionEventKind::Result);
    assert!(!ev.is_init());
}

#[test]
fn slow_consumer_event_reason_round_trips_through_json() {
    let ev = SessionEvent::slow_consumer(1);
    let json = serde_json::to_value(&ev).unwrap();
    assert_eq!(json["raw"]["reason"], "slow_consumer");
}

#[test]
fn is_init_requires_system_kind_and_init_subtype() {
    let mut ev = SessionEvent::raw("x", 0);
    ev.kind = SessionEventKind::System;
    ev.subtype = Some("init".to_string());
    assert!(ev.is_init());

    ev.subtype = Some("other".to_string());
    assert!(!ev.is_init());
}

#[test]
fn raw_session_event_deserializes_minimal_record() {
    let json = r#"{"type":"system","subtype":"init","session_id":"u-42"}"#;
    let raw: RawSessionEvent = serde_json::from_str(json).unwrap();
    assert_eq!(raw.type_, "system");
    assert_eq!(raw.subtype.as_deref(), Some("init"));
    assert_eq!(raw.session_id.as_deref(), Some("u-42"));
}

#[test]
fn from_raw_init_record_sets_upstream_id_and_is_init() {
    let json = r#"{"type":"system","subtype":"init","session_id":"u-42"}"#;
    let raw: RawSessionEvent = serde_json::from_str(json).unwrap();
    let original: serde_json::Value = serde_json::from_str(json).unwrap();
    let ev = SessionEvent::from_raw(raw, original, 7);
    assert!(ev.is_init());
    assert_eq!(ev.upstream_session_id.as_deref(), Some("u-42"));
}

#[test]
fn from_raw_unknown_type_falls_back_to_raw_kind() {
    let json = r#"{"type":"something_new"}"#;
    let raw: RawSessionEvent = serde_json::from_str(json).unwrap();
    let original: serde_json::Value = serde_json::from_str(json).unwrap();
    let ev = SessionEvent::from_raw(raw, original, 1);
    assert_eq!(ev.kind, SessionEventKind::Raw);
}

#[test]
fn pty_data_wraps_opaque_text() {
    let ev = SessionEvent::pty_data("some bytes", 3);
    assert_eq!(ev.subtype.as_deref(), Some("pty_data"));
    assert_eq!(ev.text.as_deref(), Some("some bytes"));
}

#[test]
fn pending_send_failed_carries_the_reason() {
    let ev = SessionEvent::pending_send_failed("session never reached running", 9);
    assert_eq!(ev.kind, SessionEventKind::Error);
    assert_eq!(ev.subtype.as_deref(), Some("pending_send_failed"));
    assert_eq!(ev.text.as_deref(), Some("session never reached running"));
}
