// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session event types.
//!
//! A [`SessionEvent`] is the parsed form of one line of the headless agent
//! protocol, or a synthesized event for interactive/PTY sessions
//! and bus-internal signals (slow-consumer eviction, stream close). The raw
//! JSON is always kept alongside the extracted fields so consumers that need
//! provider-specific payloads can still get at them.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Discriminator matching the wire protocol's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    System,
    Assistant,
    User,
    ToolUse,
    ToolResult,
    Result,
    Error,
    /// Output line that failed to parse as the expected JSON protocol, or
    /// opaque PTY byte output in interactive mode.
    Raw,
}

/// One event observed on a session's stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub received_at_ms: u64,
    /// The raw record as received, preserved verbatim for passthrough to
    /// dashboards that want provider-specific fields this type doesn't model.
    pub raw: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,
    /// Present only on the subprocess's first event, `{type: system, subtype: init}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_session_id: Option<String>,
}

impl SessionEvent {
    /// Wrap an unparseable stdout line or opaque PTY bytes as a raw event.
    /// these never terminate the session.
    pub fn raw(line: impl Into<String>, received_at_ms: u64) -> Self {
        let line = line.into();
        Self {
            kind: SessionEventKind::Raw,
            subtype: None,
            received_at_ms,
            raw: serde_json::Value::String(line.clone()),
            text: Some(line),
            tool_name: None,
            tool_use_id: None,
            tool_input: None,
            upstream_session_id: None,
        }
    }

    /// The synthetic terminal event the Event Bus emits to every subscriber
    /// when the session's process exits.
    pub fn terminal(received_at_ms: u64) -> Self {
        Self {
            kind: SessionEventKind::Result,
            subtype: Some("session_end".to_string()),
            received_at_ms,
            raw: serde_json::json!({"type": "result"}),
            text: None,
            tool_name: None,
            tool_use_id: None,
            tool_input: None,
            upstream_session_id: None,
        }
    }

    /// The eviction notice sent to a subscriber whose buffer overflowed.
    pub fn slow_consumer(received_at_ms: u64) -> Self {
        Self {
            kind: SessionEventKind::Error,
            subtype: Some("slow_consumer".to_string()),
            received_at_ms,
            raw: serde_json::json!({"type": "error", "reason": "slow_consumer"}),
            text: Some("slow_consumer".to_string()),
            tool_name: None,
            tool_use_id: None,
            tool_input: None,
            upstream_session_id: None,
        }
    }

    /// A message queued while the session was still starting that could
    /// never be delivered because the session never reached `running`.
    pub fn pending_send_failed(reason: impl Into<String>, received_at_ms: u64) -> Self {
        let reason = reason.into();
        Self {
            kind: SessionEventKind::Error,
            subtype: Some("pending_send_failed".to_string()),
            received_at_ms,
            raw: serde_json::json!({"type": "error", "reason": reason}),
            text: Some(reason),
            tool_name: None,
            tool_use_id: None,
            tool_input: None,
            upstream_session_id: None,
        }
    }

    pub fn is_init(&self) -> bool {
        self.kind == SessionEventKind::System && self.subtype.as_deref() == Some("init")
    }

    /// Opaque PTY output, forwarded verbatim in interactive mode.
    pub fn pty_data(text: impl Into<String>, received_at_ms: u64) -> Self {
        let text = text.into();
        Self {
            kind: SessionEventKind::Raw,
            subtype: Some("pty_data".to_string()),
            received_at_ms,
            raw: serde_json::Value::String(text.clone()),
            text: Some(text),
            tool_name: None,
            tool_use_id: None,
            tool_input: None,
            upstream_session_id: None,
        }
    }

    /// Lift a parsed wire record into a [`SessionEvent`], keeping the
    /// original JSON alongside the extracted fields.
    pub fn from_raw(raw: RawSessionEvent, original: serde_json::Value, received_at_ms: u64) -> Self {
        let kind = match raw.type_.as_str() {
            "system" => SessionEventKind::System,
            "assistant" => SessionEventKind::Assistant,
            "user" => SessionEventKind::User,
            "tool_use" => SessionEventKind::ToolUse,
            "tool_result" => SessionEventKind::ToolResult,
            "result" => SessionEventKind::Result,
            "error" => SessionEventKind::Error,
            _ => SessionEventKind::Raw,
        };
        let text = raw
            .content
            .clone()
            .or_else(|| raw.error.clone())
            .or_else(|| raw.message.as_ref().and_then(|m| m.as_str().map(str::to_string)));
        Self {
            kind,
            subtype: raw.subtype,
            received_at_ms,
            raw: original,
            text,
            tool_name: raw.tool,
            tool_use_id: raw.tool_use_id,
            tool_input: raw.tool_input,
            upstream_session_id: raw.session_id,
        }
    }
}

/// Raw wire shape for a headless-mode stdout line, deserialized before being
/// lifted into a [`SessionEvent`] by the spawner.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSessionEvent {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub tool_input: Option<serde_json::Value>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
