// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/events/stream` (aggregated SSE) and `/ws` (subscribe/event
//! websocket), both backed by [`crate::channel_bus::ChannelBus`].

use std::collections::HashSet;
use std::convert::Infallible;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::stream::Stream;
use futures::{SinkExt, StreamExt};
use orc_adapters::AgentProvider;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    channels: Option<String>,
}

fn parse_channels(raw: Option<&str>) -> Option<HashSet<String>> {
    raw.map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
}

/// The event emitted in place of whatever was lost, mirroring
/// `orc_core::SessionEvent::slow_consumer`'s shape for the aggregated feed,
/// which has no `SessionEvent` of its own to reuse.
fn slow_consumer_payload() -> String {
    serde_json::json!({"type": "error", "reason": "slow_consumer"}).to_string()
}

/// Tolerates an arbitrarily slow client up to the broadcast channel's
/// buffer, then — rather than silently dropping the events it missed and
/// carrying on out of sync — emits one final `slow_consumer` error and ends
/// the stream, the same contract `EventBus`'s per-session eviction applies.
pub async fn aggregated_stream<P: AgentProvider>(
    State(state): State<AppState<P>>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let wanted = parse_channels(query.channels.as_deref());
    let rx = state.channels.subscribe();

    let events = futures::stream::unfold(Some(rx), move |rx| {
        let wanted = wanted.clone();
        async move {
            let mut rx = rx?;
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let keep = match &wanted {
                            Some(w) => w.contains(&event.channel),
                            None => true,
                        };
                        if !keep {
                            continue;
                        }
                        let data = serde_json::to_string(&event.payload).unwrap_or_else(|_| "{}".to_string());
                        let sse_event = Event::default().event(event.channel).data(data);
                        return Some((Ok(sse_event), Some(rx)));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "aggregated stream: subscriber lagged, closing");
                        let sse_event = Event::default().event("error").data(slow_consumer_payload());
                        return Some((Ok(sse_event), None));
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn ws_upgrade<P: AgentProvider>(
    State(state): State<AppState<P>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { channels: Vec<String> },
}

async fn handle_socket<P: AgentProvider>(socket: WebSocket, state: AppState<P>) {
    let (mut sink, mut source) = socket.split();
    let mut subscribed: HashSet<String> = HashSet::new();
    let mut channel_rx: broadcast::Receiver<crate::channel_bus::ChannelEvent> = state.channels.subscribe();
    let max_missed_pongs = state.config.ws_max_missed_pongs;
    let mut missed_pongs: u32 = 0;
    let mut ping_tick = tokio::time::interval(state.config.ws_ping_interval);
    ping_tick.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ClientMessage::Subscribe { channels }) = serde_json::from_str(&text) {
                            subscribed = channels.into_iter().collect();
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "websocket read error");
                        break;
                    }
                }
            }
            event = channel_rx.recv() => {
                match event {
                    Ok(event) if subscribed.is_empty() || subscribed.contains(&event.channel) => {
                        let frame = serde_json::json!({
                            "type": "event",
                            "channel": event.channel,
                            "payload": event.payload,
                        });
                        if sink.send(Message::Text(frame.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "websocket: subscriber lagged, closing");
                        let frame = serde_json::json!({"type": "error", "reason": "slow_consumer"});
                        let _ = sink.send(Message::Text(frame.to_string())).await;
                        break;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = ping_tick.tick() => {
                missed_pongs += 1;
                if missed_pongs > max_missed_pongs {
                    debug!("websocket: client missed {max_missed_pongs} pongs, closing");
                    break;
                }
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}
