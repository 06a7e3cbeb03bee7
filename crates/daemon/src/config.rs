// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration, read from the environment the way the teacher's
//! `oj_daemon::env` module reads `OJ_*` variables — no config file, since
//! this subsystem's durable state lives entirely in the external task
//! store.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use orc_engine::DispatchConfig;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub bind_addr: SocketAddr,
    pub dispatch: DispatchConfig,
    /// Forwarded to every spawned agent as `ELEMENTAL_ROOT` and used as the
    /// default working directory when a start request doesn't name one.
    pub workspace_root: PathBuf,
    /// How often `/ws` pings each connected client.
    pub ws_ping_interval: Duration,
    /// Consecutive missed pongs before `/ws` closes a client's socket.
    pub ws_max_missed_pongs: u32,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 4780),
            dispatch: DispatchConfig::default(),
            workspace_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            ws_ping_interval: Duration::from_secs(15),
            ws_max_missed_pongs: 3,
        }
    }
}

impl DaemonConfig {
    /// Reads `ORC_BIND_ADDR`, `ORC_DISPATCH_TICK_MS`, `ORC_DISPATCH_BATCH_SIZE`,
    /// `ORC_DISPATCH_MAX_BACKOFF_MS`, `ORC_DISPATCH_STORE_TIMEOUT_MS`,
    /// `ORC_WS_PING_INTERVAL_MS` and `ORC_WS_MAX_MISSED_PONGS`, falling back
    /// to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("ORC_BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bind_addr);

        let tick_interval = env_millis("ORC_DISPATCH_TICK_MS")
            .unwrap_or(defaults.dispatch.tick_interval);
        let max_backoff = env_millis("ORC_DISPATCH_MAX_BACKOFF_MS")
            .unwrap_or(defaults.dispatch.max_backoff);
        let store_call_timeout = env_millis("ORC_DISPATCH_STORE_TIMEOUT_MS")
            .unwrap_or(defaults.dispatch.store_call_timeout);
        let batch_size = std::env::var("ORC_DISPATCH_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.dispatch.batch_size);

        let workspace_root = std::env::var("ELEMENTAL_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.workspace_root);

        let ws_ping_interval =
            env_millis("ORC_WS_PING_INTERVAL_MS").unwrap_or(defaults.ws_ping_interval);
        let ws_max_missed_pongs = std::env::var("ORC_WS_MAX_MISSED_PONGS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.ws_max_missed_pongs);

        Self {
            bind_addr,
            dispatch: DispatchConfig {
                tick_interval,
                batch_size,
                max_backoff,
                store_call_timeout,
            },
            workspace_root,
            ws_ping_interval,
            ws_max_missed_pongs,
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key).ok()?.parse::<u64>().ok().map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_to_all_interfaces_on_4780() {
        let config = DaemonConfig::default();
        assert_eq!(config.bind_addr.port(), 4780);
    }
}
