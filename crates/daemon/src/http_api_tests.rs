// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives the real axum router over a bound TCP listener with a
//! `FakeProvider` behind it, the same black-box style the teacher uses to
//! drive its Unix-socket wire protocol end to end rather than calling
//! handler functions directly.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use orc_adapters::FakeProvider;
use orc_core::{AgentId, AgentRecord, AgentRole, CapabilitySet, SessionStatus, SystemClock};
use orc_engine::{
    DispatchConfig, DispatchDaemon, EventBus, EventBusConfig, SessionManager,
    SessionManagerConfig, Spawner, SpawnerConfig,
};
use orc_store::{InMemoryTaskStore, TaskStore};

use crate::channel_bus::ChannelBus;
use crate::config::DaemonConfig;
use crate::state::AppState;

async fn spawn_test_server() -> (SocketAddr, Arc<InMemoryTaskStore>) {
    let clock = SystemClock;
    let store = Arc::new(InMemoryTaskStore::new());
    let dyn_store: Arc<dyn TaskStore> = store.clone();

    let bus = Arc::new(EventBus::new(clock, EventBusConfig::default()));
    let provider = Arc::new(FakeProvider::new("fake"));
    let spawner = Arc::new(Spawner::new(provider, bus.clone(), clock, SpawnerConfig::default()));
    let manager = Arc::new(SessionManager::new(
        spawner,
        bus.clone(),
        clock,
        SessionManagerConfig::default(),
        Some(dyn_store.clone()),
    ));
    let dispatch = Arc::new(DispatchDaemon::spawn(dyn_store.clone(), DispatchConfig::default()));

    let app_state: AppState<FakeProvider> = AppState {
        manager,
        bus,
        dispatch,
        store: dyn_store,
        channels: Arc::new(ChannelBus::new()),
        config: Arc::new(DaemonConfig {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0),
            dispatch: DispatchConfig::default(),
            workspace_root: std::env::temp_dir(),
            ws_ping_interval: Duration::from_millis(50),
            ws_max_missed_pongs: 2,
        }),
    };

    let app = crate::routes::router(app_state);
    let listener = tokio::net::TcpListener::bind((IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, store)
}

fn seed_worker(store: &InMemoryTaskStore, agent_id: &str) {
    store.seed_agent(
        AgentId::from(agent_id),
        agent_id,
        AgentRecord {
            agent_role: AgentRole::Worker,
            worker_mode: None,
            steward_focus: None,
            session_status: SessionStatus::Terminated,
            session_id: None,
            capabilities: CapabilitySet::default(),
            max_concurrent_tasks: 1,
        },
    );
}

#[tokio::test]
async fn start_then_stop_round_trip() {
    let (addr, store) = spawn_test_server().await;
    seed_worker(&store, "agent-1");
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let resp = client
        .post(format!("{base}/agents/agent-1/start"))
        .json(&serde_json::json!({"initial_prompt": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["session_id"].as_str().is_some());

    let resp = client
        .post(format!("{base}/agents/agent-1/stop"))
        .json(&serde_json::json!({"graceful": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn suspend_then_resume_round_trip() {
    let (addr, store) = spawn_test_server().await;
    seed_worker(&store, "agent-suspend");
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let resp = client
        .post(format!("{base}/agents/agent-suspend/start"))
        .json(&serde_json::json!({"initial_prompt": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let resp = client
        .post(format!("{base}/agents/agent-suspend/suspend"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let resp = client
        .post(format!("{base}/agents/agent-suspend/start"))
        .json(&serde_json::json!({"resume": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["session_id"].as_str().is_some());
}

#[tokio::test]
async fn message_to_unknown_agent_returns_404() {
    let (addr, _store) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/agents/ghost/message"))
        .json(&serde_json::json!({"content": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn start_on_unregistered_agent_returns_404() {
    let (addr, _store) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/agents/nobody/start"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn message_after_start_is_accepted() {
    let (addr, store) = spawn_test_server().await;
    seed_worker(&store, "agent-2");
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    client
        .post(format!("{base}/agents/agent-2/start"))
        .json(&serde_json::json!({"initial_prompt": "hello"}))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/agents/agent-2/message"))
        .json(&serde_json::json!({"content": "how's it going?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn dispatch_poll_now_and_stats_are_reachable() {
    let (addr, _store) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let resp = client.post(format!("{base}/dispatch/poll-now")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let stats: serde_json::Value = resp.json().await.unwrap();
    assert!(stats["assigned"].is_number());

    let resp = client.get(format!("{base}/dispatch/stats")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn agent_stream_returns_sse_content_type_after_start() {
    let (addr, store) = spawn_test_server().await;
    seed_worker(&store, "agent-3");
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    client
        .post(format!("{base}/agents/agent-3/start"))
        .json(&serde_json::json!({"initial_prompt": "hello"}))
        .send()
        .await
        .unwrap();

    let resp = tokio::time::timeout(
        Duration::from_secs(2),
        client.get(format!("{base}/agents/agent-3/stream")).send(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

/// Speaks the websocket handshake over a raw TCP socket instead of pulling
/// in a client library, so nothing auto-answers the server's pings on our
/// behalf — the point of this test is a client that never pongs.
#[tokio::test]
async fn ws_socket_closes_after_client_never_pongs() {
    let (addr, _store) = spawn_test_server().await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET /ws HTTP/1.1\r\nHost: {addr}\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before handshake completed");
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    let response = String::from_utf8_lossy(&buf);
    assert!(response.starts_with("HTTP/1.1 101"), "unexpected handshake response: {response}");

    // Never send a pong, or anything else, back. The test server pings
    // every 50ms and closes after 2 missed pongs, so the socket should
    // close well within this bound.
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "server never closed the idle websocket");
}
