// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use orc_adapters::AgentProvider;
use orc_core::SystemClock;
use orc_engine::{DispatchDaemon, EventBus, SessionManager};
use orc_store::TaskStore;

use crate::channel_bus::ChannelBus;
use crate::config::DaemonConfig;

/// Shared handles every route closes over. Generic over the provider so
/// tests can wire a `FakeProvider` through the exact same router the real
/// binary serves, instead of spawning real subprocesses — the same
/// reasoning as `orc-engine`'s own `Spawner<P, C>`/`SessionManager<P, C>`.
pub struct AppState<P: AgentProvider> {
    pub manager: Arc<SessionManager<P, SystemClock>>,
    pub bus: Arc<EventBus<SystemClock>>,
    pub dispatch: Arc<DispatchDaemon>,
    pub store: Arc<dyn TaskStore>,
    pub channels: Arc<ChannelBus>,
    pub config: Arc<DaemonConfig>,
}

impl<P: AgentProvider> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            bus: self.bus.clone(),
            dispatch: self.dispatch.clone(),
            store: self.store.clone(),
            channels: self.channels.clone(),
            config: self.config.clone(),
        }
    }
}
