// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Orchestration Core daemon (`orcd`)
//!
//! Wires the event bus, spawner, session manager, and dispatch daemon from
//! `orc-engine` behind an axum HTTP/SSE/WebSocket server. Analogous to the
//! teacher's `ojd` binary, but speaks HTTP instead of a Unix-socket wire
//! protocol, and the event loop is axum's own rather than a hand-rolled
//! `tokio::select!` over a WAL reader.

mod channel_bus;
mod config;
mod error;
mod routes;
mod state;

#[cfg(test)]
mod http_api_tests;

use std::sync::Arc;

use orc_adapters::ClaudeCodeProvider;
use orc_core::SystemClock;
use orc_engine::{DispatchDaemon, EventBus, EventBusConfig, SessionManager, SessionManagerConfig, Spawner, SpawnerConfig};
use orc_store::InMemoryTaskStore;
use orc_store::TaskStore;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::channel_bus::ChannelBus;
use crate::config::DaemonConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = DaemonConfig::from_env();
    let clock = SystemClock;
    let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());

    let bus = Arc::new(EventBus::new(clock, EventBusConfig::default()));
    let provider = Arc::new(ClaudeCodeProvider::new());
    let spawner = Arc::new(Spawner::new(provider, bus.clone(), clock, SpawnerConfig::default()));
    let manager = Arc::new(SessionManager::new(
        spawner,
        bus.clone(),
        clock,
        SessionManagerConfig::default(),
        Some(store.clone()),
    ));
    let dispatch = Arc::new(DispatchDaemon::spawn(store.clone(), config.dispatch));

    let state: AppState<ClaudeCodeProvider> = AppState {
        manager,
        bus,
        dispatch: dispatch.clone(),
        store,
        channels: Arc::new(ChannelBus::new()),
        config: Arc::new(config.clone()),
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "orcd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dispatch.stop().await;
    info!("orcd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(_) => return,
    };
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
