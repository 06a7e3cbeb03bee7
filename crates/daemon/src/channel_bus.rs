// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-session fan-out for `/api/events/stream` and `/ws`.
//!
//! Per-session events already have a dedicated fan-out in
//! [`orc_engine::EventBus`]; this is the coarser "tasks"/"sessions" channel
//! split the aggregated feed and the websocket subscribe model need on top
//! of that, grounded on the teacher's `Command`-over-`mpsc` shape from its
//! SSE handler but backed by `broadcast` since every aggregated subscriber
//! should see the same events, not a private queue each.

use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize)]
pub struct ChannelEvent {
    pub channel: String,
    pub payload: serde_json::Value,
}

pub struct ChannelBus {
    tx: broadcast::Sender<ChannelEvent>,
}

impl ChannelBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, channel: impl Into<String>, payload: serde_json::Value) {
        let event = ChannelEvent {
            channel: channel.into(),
            payload,
        };
        // No subscribers is the common case between bursts of activity; a
        // send error here just means nobody is listening right now.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChannelBus {
    fn default() -> Self {
        Self::new()
    }
}
