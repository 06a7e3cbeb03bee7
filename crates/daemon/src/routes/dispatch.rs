// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::State;
use axum::Json;
use orc_adapters::AgentProvider;
use orc_engine::DispatchStats;

use crate::state::AppState;

pub async fn poll_now<P: AgentProvider>(State(state): State<AppState<P>>) -> Json<DispatchStats> {
    state.dispatch.poll_now().await;
    Json(state.dispatch.stats())
}

pub async fn stats<P: AgentProvider>(State(state): State<AppState<P>>) -> Json<DispatchStats> {
    Json(state.dispatch.stats())
}
