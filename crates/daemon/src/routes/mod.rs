// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod agents;
mod dispatch;
mod events;

use axum::routing::{get, post};
use axum::Router;
use orc_adapters::AgentProvider;

use crate::state::AppState;

pub fn router<P: AgentProvider>(state: AppState<P>) -> Router {
    Router::new()
        .route("/agents/:id/start", post(agents::start))
        .route("/agents/:id/stop", post(agents::stop))
        .route("/agents/:id/suspend", post(agents::suspend))
        .route("/agents/:id/message", post(agents::message))
        .route("/agents/:id/stream", get(agents::stream))
        .route("/api/events/stream", get(events::aggregated_stream))
        .route("/ws", get(events::ws_upgrade))
        .route("/dispatch/poll-now", post(dispatch::poll_now))
        .route("/dispatch/stats", get(dispatch::stats))
        .with_state(state)
}
