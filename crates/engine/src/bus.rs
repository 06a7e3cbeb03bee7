// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session event fan-out with slow-consumer eviction.
//!
//! `tokio::sync::broadcast` can't evict one lagging receiver in isolation —
//! a lagged receiver just skips messages, and every other receiver pays the
//! same ring-buffer size. Instead each subscriber gets its own bounded
//! `mpsc` channel; a full channel means that one subscriber, and only that
//! one, is evicted.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, Stream};
use orc_core::{Clock, SessionEvent, SessionId};
use parking_lot::Mutex;
use tokio::sync::mpsc;

pub type EventStream = Pin<Box<dyn Stream<Item = SessionEvent> + Send>>;

#[derive(Debug, Clone, Copy)]
pub struct EventBusConfig {
    /// Buffer depth per subscriber before it is evicted.
    pub subscriber_buffer: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: 64,
        }
    }
}

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<SessionEvent>,
    eviction_slot: Arc<Mutex<Option<SessionEvent>>>,
}

#[derive(Default)]
struct SessionSlot {
    subscribers: Vec<Subscriber>,
    next_sub_id: u64,
    closed: bool,
}

pub struct EventBus<C: Clock> {
    clock: C,
    config: EventBusConfig,
    sessions: Mutex<HashMap<SessionId, SessionSlot>>,
}

impl<C: Clock> EventBus<C> {
    pub fn new(clock: C, config: EventBusConfig) -> Self {
        Self {
            clock,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to `session_id`. If the session has already been closed,
    /// the returned stream ends immediately with no events.
    pub fn subscribe(&self, session_id: &SessionId) -> EventStream {
        let mut sessions = self.sessions.lock();
        let slot = sessions.entry(session_id.clone()).or_default();

        if slot.closed {
            let (_tx, rx) = mpsc::channel(1);
            return make_stream(rx, Arc::new(Mutex::new(None)));
        }

        let id = slot.next_sub_id;
        slot.next_sub_id += 1;
        let (tx, rx) = mpsc::channel(self.config.subscriber_buffer.max(1));
        let eviction_slot = Arc::new(Mutex::new(None));
        slot.subscribers.push(Subscriber {
            id,
            tx,
            eviction_slot: eviction_slot.clone(),
        });
        make_stream(rx, eviction_slot)
    }

    /// Deliver one event to every current subscriber of `session_id`.
    /// No-op if the session is closed or has no subscribers.
    pub fn publish(&self, session_id: &SessionId, event: SessionEvent) {
        let snapshot: Vec<(u64, mpsc::Sender<SessionEvent>, Arc<Mutex<Option<SessionEvent>>>)> = {
            let mut sessions = self.sessions.lock();
            let slot = sessions.entry(session_id.clone()).or_default();
            if slot.closed {
                return;
            }
            slot.subscribers
                .iter()
                .map(|s| (s.id, s.tx.clone(), s.eviction_slot.clone()))
                .collect()
        };

        let mut evicted_ids = Vec::new();
        for (id, tx, eviction_slot) in snapshot {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    *eviction_slot.lock() = Some(SessionEvent::slow_consumer(self.clock.now_ms()));
                    evicted_ids.push(id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    evicted_ids.push(id);
                }
            }
        }

        if !evicted_ids.is_empty() {
            let mut sessions = self.sessions.lock();
            if let Some(slot) = sessions.get_mut(session_id) {
                slot.subscribers.retain(|s| !evicted_ids.contains(&s.id));
            }
        }
    }

    /// Emit the synthetic terminal event to every subscriber, then close
    /// the session: further publishes are dropped and further subscribers
    /// get an immediately-closed stream.
    pub fn close(&self, session_id: &SessionId) {
        let terminal = SessionEvent::terminal(self.clock.now_ms());
        self.publish(session_id, terminal);
        let mut sessions = self.sessions.lock();
        let slot = sessions.entry(session_id.clone()).or_default();
        slot.closed = true;
        slot.subscribers.clear();
    }

    pub fn subscriber_count(&self, session_id: &SessionId) -> usize {
        self.sessions
            .lock()
            .get(session_id)
            .map(|s| s.subscribers.len())
            .unwrap_or(0)
    }
}

type UnfoldState = (
    mpsc::Receiver<SessionEvent>,
    Arc<Mutex<Option<SessionEvent>>>,
    bool,
);

fn make_stream(
    rx: mpsc::Receiver<SessionEvent>,
    eviction_slot: Arc<Mutex<Option<SessionEvent>>>,
) -> EventStream {
    Box::pin(stream::unfold(
        (rx, eviction_slot, false),
        |state: UnfoldState| -> Pin<Box<dyn Future<Output = Option<(SessionEvent, UnfoldState)>> + Send>> {
            Box::pin(async move {
                let (mut rx, eviction_slot, done) = state;
                if done {
                    return None;
                }
                match rx.recv().await {
                    Some(event) => Some((event, (rx, eviction_slot, false))),
                    None => {
                        let final_event = eviction_slot.lock().take();
                        final_event.map(|event| (event, (rx, eviction_slot, true)))
                    }
                }
            })
        },
    ))
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
