// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess supervision: spawn one process per session, translate its
//! output into typed events, provide a write path, and enforce the session
//! state machine.
//!
//! Headless stdout is read on a tokio task (the I/O is already async via
//! `tokio::process`). Interactive PTY I/O is synchronous by nature
//! (`portable_pty`'s traits are plain `Read`/`Write`), so it runs on a
//! dedicated OS thread per session instead of being forced through
//! `spawn_blocking` for every chunk.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orc_adapters::{
    scrape_session_id, AgentProvider, HeadlessSpawnOpts, InteractiveSpawnOpts, PtyDimensions,
};
use orc_core::{AgentId, Clock, RawSessionEvent, SessionEvent, SessionId, SessionStatus};
use parking_lot::Mutex;
use portable_pty::MasterPty;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::time::timeout;

use crate::bus::EventBus;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Headless,
    Interactive,
}

#[derive(Debug, Clone)]
pub struct SpawnerConfig {
    pub init_handshake_timeout: Duration,
    pub graceful_stop_timeout: Duration,
    pub default_pty_dimensions: PtyDimensions,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            init_handshake_timeout: Duration::from_secs(120),
            graceful_stop_timeout: Duration::from_secs(5),
            default_pty_dimensions: PtyDimensions::default(),
        }
    }
}

impl SpawnerConfig {
    /// The init handshake timeout never drops below 5s; a caller-supplied
    /// value below that floor would make spawn failures indistinguishable
    /// from ordinary upstream latency.
    pub fn with_init_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.init_handshake_timeout = timeout.max(Duration::from_secs(5));
        self
    }
}

type PtyChild = Box<dyn portable_pty::Child + Send + Sync>;
type PtyMaster = Box<dyn MasterPty + Send>;

#[derive(Clone)]
enum Handle {
    Headless {
        stdin: Arc<AsyncMutex<ChildStdin>>,
        child: Arc<AsyncMutex<Child>>,
    },
    Interactive {
        writer_tx: mpsc::Sender<Vec<u8>>,
        master: Arc<Mutex<PtyMaster>>,
        child: Arc<Mutex<PtyChild>>,
    },
}

struct SessionRecord {
    agent_id: AgentId,
    #[allow(dead_code)]
    mode: SessionMode,
    status: SessionStatus,
    #[allow(dead_code)]
    working_dir: PathBuf,
    upstream_session_id: Option<String>,
    created_at_ms: u64,
    #[allow(dead_code)]
    ended_at_ms: Option<u64>,
    ended_guard: Arc<AtomicBool>,
    handle: Handle,
}

type SessionMap = Mutex<HashMap<SessionId, SessionRecord>>;

/// Creates and supervises agent subprocesses on behalf of one provider.
pub struct Spawner<P, C: Clock> {
    provider: Arc<P>,
    bus: Arc<EventBus<C>>,
    clock: C,
    config: SpawnerConfig,
    sessions: Arc<SessionMap>,
}

impl<P: AgentProvider, C: Clock> Spawner<P, C> {
    pub fn new(provider: Arc<P>, bus: Arc<EventBus<C>>, clock: C, config: SpawnerConfig) -> Self {
        Self {
            provider,
            bus,
            clock,
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn parse_headless_line(&self, line: &str) -> SessionEvent {
        let now = self.clock.now_ms();
        match serde_json::from_str::<RawSessionEvent>(line) {
            Ok(raw) => {
                let original = serde_json::from_str(line).unwrap_or(serde_json::Value::Null);
                SessionEvent::from_raw(raw, original, now)
            }
            Err(_) => SessionEvent::raw(line.to_string(), now),
        }
    }

    /// Spawns a headless session under caller-assigned `session_id` (logical
    /// identity is the Session Manager's concern, not the Spawner's), writes
    /// `initial_turn` to stdin (the subprocess blocks on this), and awaits
    /// the `system/init` handshake before returning.
    pub async fn start_headless(
        &self,
        session_id: SessionId,
        agent_id: AgentId,
        opts: HeadlessSpawnOpts,
        initial_turn: serde_json::Value,
    ) -> Result<SessionId, EngineError> {
        let working_dir = opts.cwd.clone();
        let mut child = self.provider.spawn_headless(opts).await?;

        let payload = format!("{initial_turn}\n");
        if let Err(e) = child.stdin.write_all(payload.as_bytes()).await {
            let _ = child.child.start_kill();
            return Err(EngineError::ParseFailure(format!(
                "failed to write initial turn: {e}"
            )));
        }

        let ended_guard = Arc::new(AtomicBool::new(false));
        let created_at_ms = self.clock.now_ms();

        self.sessions.lock().insert(
            session_id.clone(),
            SessionRecord {
                agent_id,
                mode: SessionMode::Headless,
                status: SessionStatus::Starting,
                working_dir,
                upstream_session_id: None,
                created_at_ms,
                ended_at_ms: None,
                ended_guard: ended_guard.clone(),
                handle: Handle::Headless {
                    stdin: Arc::new(AsyncMutex::new(child.stdin)),
                    child: Arc::new(AsyncMutex::new(child.child)),
                },
            },
        );

        let mut lines = child.stdout_lines;
        let handshake = async {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let event = self.parse_headless_line(&line);
                        let is_init = event.is_init();
                        let upstream = event.upstream_session_id.clone();
                        self.bus.publish(&session_id, event);
                        if is_init {
                            return Ok(upstream);
                        }
                    }
                    Ok(None) => {
                        return Err(EngineError::ParseFailure(
                            "subprocess closed stdout before init".to_string(),
                        ))
                    }
                    Err(e) => return Err(EngineError::ParseFailure(e.to_string())),
                }
            }
        };

        match timeout(self.config.init_handshake_timeout, handshake).await {
            Ok(Ok(upstream)) => {
                transition(&self.sessions, &session_id, SessionStatus::Running)?;
                if let Some(upstream) = upstream {
                    if let Some(record) = self.sessions.lock().get_mut(&session_id) {
                        record.upstream_session_id = Some(upstream);
                    }
                }
                self.spawn_headless_reader(session_id.clone(), lines, ended_guard);
                Ok(session_id)
            }
            Ok(Err(e)) => {
                mark_terminated_once(&self.sessions, &self.bus, &self.clock, &session_id, &ended_guard);
                Err(e)
            }
            Err(_) => {
                mark_terminated_once(&self.sessions, &self.bus, &self.clock, &session_id, &ended_guard);
                Err(EngineError::Timeout(format!(
                    "init handshake for session {}",
                    session_id.as_str()
                )))
            }
        }
    }

    fn spawn_headless_reader(
        &self,
        session_id: SessionId,
        mut lines: tokio::io::Lines<tokio::io::BufReader<tokio::process::ChildStdout>>,
        ended_guard: Arc<AtomicBool>,
    ) {
        let bus = self.bus.clone();
        let clock = self.clock.clone();
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let now = clock.now_ms();
                        let event = match serde_json::from_str::<RawSessionEvent>(&line) {
                            Ok(raw) => {
                                let original =
                                    serde_json::from_str(&line).unwrap_or(serde_json::Value::Null);
                                SessionEvent::from_raw(raw, original, now)
                            }
                            Err(_) => SessionEvent::raw(line, now),
                        };
                        bus.publish(&session_id, event);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(session_id = %session_id.as_str(), error = %e, "stdout read error");
                        break;
                    }
                }
            }
            mark_terminated_once(&sessions, &bus, &clock, &session_id, &ended_guard);
        });
    }

    /// Spawns an interactive (PTY-backed) session under caller-assigned
    /// `session_id`. No protocol handshake — the session is `running` as
    /// soon as the PTY exists.
    pub async fn start_interactive(
        &self,
        session_id: SessionId,
        agent_id: AgentId,
        opts: InteractiveSpawnOpts,
    ) -> Result<SessionId, EngineError> {
        let working_dir = opts.cwd.clone();
        let interactive = self.provider.spawn_interactive(opts).await?;

        let ended_guard = Arc::new(AtomicBool::new(false));
        let created_at_ms = self.clock.now_ms();

        let (writer_tx, mut writer_rx) = mpsc::channel::<Vec<u8>>(64);
        let master: Arc<Mutex<PtyMaster>> = Arc::new(Mutex::new(interactive.master));
        let child: Arc<Mutex<PtyChild>> = Arc::new(Mutex::new(interactive.child));

        self.sessions.lock().insert(
            session_id.clone(),
            SessionRecord {
                agent_id,
                mode: SessionMode::Interactive,
                status: SessionStatus::Running,
                working_dir,
                upstream_session_id: None,
                created_at_ms,
                ended_at_ms: None,
                ended_guard: ended_guard.clone(),
                handle: Handle::Interactive {
                    writer_tx,
                    master,
                    child: child.clone(),
                },
            },
        );

        let mut writer = interactive.writer;
        let writer_thread_name = format!("pty-writer-{}", session_id.short(8));
        std::thread::Builder::new()
            .name(writer_thread_name)
            .spawn(move || {
                while let Some(bytes) = writer_rx.blocking_recv() {
                    if writer.write_all(&bytes).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| EngineError::ResourceExhausted(e.to_string()))?;

        let mut reader = interactive.reader;
        let bus = self.bus.clone();
        let clock = self.clock.clone();
        let sessions = self.sessions.clone();
        let reader_session_id = session_id.clone();
        let reader_thread_name = format!("pty-reader-{}", session_id.short(8));
        std::thread::Builder::new()
            .name(reader_thread_name)
            .spawn(move || {
                let mut buf = [0u8; 4096];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                            if let Some(upstream) = scrape_session_id(&text) {
                                if let Some(record) = sessions.lock().get_mut(&reader_session_id) {
                                    record.upstream_session_id = Some(upstream);
                                }
                            }
                            bus.publish(
                                &reader_session_id,
                                SessionEvent::pty_data(text, clock.now_ms()),
                            );
                        }
                        Err(_) => break,
                    }
                }
                let _ = child.lock().wait();
                mark_terminated_once(&sessions, &bus, &clock, &reader_session_id, &ended_guard);
            })
            .map_err(|e| EngineError::ResourceExhausted(e.to_string()))?;

        let _ = created_at_ms;
        Ok(session_id)
    }

    pub async fn send_input(
        &self,
        session_id: &SessionId,
        payload: serde_json::Value,
    ) -> Result<(), EngineError> {
        let (stdin, status) = {
            let sessions = self.sessions.lock();
            let record = sessions
                .get(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.as_str().to_string()))?;
            match &record.handle {
                Handle::Headless { stdin, .. } => (stdin.clone(), record.status),
                Handle::Interactive { .. } => {
                    return Err(EngineError::InvalidState {
                        session_id: session_id.as_str().to_string(),
                        reason: "send_input requires headless mode; use write_pty".to_string(),
                    })
                }
            }
        };
        if !status.accepts_input() {
            return Err(EngineError::InvalidState {
                session_id: session_id.as_str().to_string(),
                reason: format!("session is {status}, not running"),
            });
        }
        let payload = format!("{payload}\n");
        let result = stdin
            .lock()
            .await
            .write_all(payload.as_bytes())
            .await
            .map_err(|e| EngineError::ParseFailure(format!("stdin write failed: {e}")));
        result
    }

    pub async fn write_pty(&self, session_id: &SessionId, bytes: Vec<u8>) -> Result<(), EngineError> {
        let (writer_tx, status) = {
            let sessions = self.sessions.lock();
            let record = sessions
                .get(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.as_str().to_string()))?;
            match &record.handle {
                Handle::Interactive { writer_tx, .. } => (writer_tx.clone(), record.status),
                Handle::Headless { .. } => {
                    return Err(EngineError::InvalidState {
                        session_id: session_id.as_str().to_string(),
                        reason: "write_pty requires interactive mode; use send_input".to_string(),
                    })
                }
            }
        };
        if !status.accepts_input() {
            return Err(EngineError::InvalidState {
                session_id: session_id.as_str().to_string(),
                reason: format!("session is {status}, not running"),
            });
        }
        writer_tx
            .send(bytes)
            .await
            .map_err(|_| EngineError::InvalidState {
                session_id: session_id.as_str().to_string(),
                reason: "pty writer has shut down".to_string(),
            })
    }

    pub async fn resize_pty(
        &self,
        session_id: &SessionId,
        dimensions: PtyDimensions,
    ) -> Result<(), EngineError> {
        let master = {
            let sessions = self.sessions.lock();
            let record = sessions
                .get(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.as_str().to_string()))?;
            match &record.handle {
                Handle::Interactive { master, .. } => master.clone(),
                Handle::Headless { .. } => {
                    return Err(EngineError::InvalidState {
                        session_id: session_id.as_str().to_string(),
                        reason: "resize_pty requires interactive mode".to_string(),
                    })
                }
            }
        };
        let guard = master.lock();
        if let Err(e) = orc_adapters::resize(&**guard, dimensions) {
            tracing::warn!(session_id = %session_id.as_str(), error = %e, "pty resize failed, downgrading to warning");
        }
        Ok(())
    }

    /// Terminates a session. Graceful sends a soft shutdown and waits up to
    /// `graceful_stop_timeout` before escalating to a forced kill; forced
    /// kills immediately. Idempotent with concurrent natural exit via the
    /// per-session `ended_guard`.
    pub async fn terminate(&self, session_id: &SessionId, graceful: bool) -> Result<(), EngineError> {
        let (handle, ended_guard) = {
            let mut sessions = self.sessions.lock();
            let record = sessions
                .get_mut(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.as_str().to_string()))?;
            if record.status.is_terminal() {
                return Ok(());
            }
            if record.status == SessionStatus::Running {
                record.status = SessionStatus::Terminating;
            }
            (record.handle.clone(), record.ended_guard.clone())
        };

        match handle {
            Handle::Headless { child, .. } => {
                kill_headless(&child, graceful, self.config.graceful_stop_timeout).await;
            }
            Handle::Interactive { writer_tx, child, .. } => {
                kill_interactive(&writer_tx, &child, graceful, self.config.graceful_stop_timeout).await;
            }
        }

        mark_terminated_once(&self.sessions, &self.bus, &self.clock, session_id, &ended_guard);
        Ok(())
    }

    /// Kills the process but keeps the session record with status
    /// `suspended`, retaining the upstream id so a caller can resume later.
    pub async fn suspend(&self, session_id: &SessionId) -> Result<(), EngineError> {
        let (handle, ended_guard) = {
            let mut sessions = self.sessions.lock();
            let record = sessions
                .get_mut(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.as_str().to_string()))?;
            if !record.status.can_transition_to(SessionStatus::Suspended) {
                return Err(EngineError::InvalidTransition {
                    session_id: session_id.as_str().to_string(),
                    from: record.status.to_string(),
                    to: SessionStatus::Suspended.to_string(),
                });
            }
            (record.handle.clone(), record.ended_guard.clone())
        };

        // Disarm the reader/writer tasks' own terminal transition before
        // killing, so their exit races never flip status back to terminated.
        ended_guard.store(true, Ordering::SeqCst);

        match handle {
            Handle::Headless { child, .. } => {
                let mut guard = child.lock().await;
                let _ = guard.start_kill();
                let _ = guard.wait().await;
            }
            Handle::Interactive { child, .. } => {
                let _ = child.lock().kill();
            }
        }

        if let Some(record) = self.sessions.lock().get_mut(session_id) {
            record.status = SessionStatus::Suspended;
        }
        Ok(())
    }

    pub fn status(&self, session_id: &SessionId) -> Option<SessionStatus> {
        self.sessions.lock().get(session_id).map(|r| r.status)
    }

    pub fn upstream_session_id(&self, session_id: &SessionId) -> Option<String> {
        self.sessions
            .lock()
            .get(session_id)
            .and_then(|r| r.upstream_session_id.clone())
    }

    pub fn list_active(&self) -> Vec<SessionId> {
        self.sessions
            .lock()
            .iter()
            .filter(|(_, r)| !r.status.is_terminal())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn list_all(&self) -> Vec<SessionId> {
        self.sessions.lock().keys().cloned().collect()
    }

    pub fn list_by_agent(&self, agent_id: &AgentId) -> Vec<SessionId> {
        self.sessions
            .lock()
            .iter()
            .filter(|(_, r)| &r.agent_id == agent_id)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn most_recent_for_agent(&self, agent_id: &AgentId) -> Option<SessionId> {
        self.sessions
            .lock()
            .iter()
            .filter(|(_, r)| &r.agent_id == agent_id)
            .max_by_key(|(_, r)| r.created_at_ms)
            .map(|(id, _)| id.clone())
    }
}

fn transition(
    sessions: &SessionMap,
    session_id: &SessionId,
    next: SessionStatus,
) -> Result<(), EngineError> {
    let mut sessions = sessions.lock();
    let record = sessions
        .get_mut(session_id)
        .ok_or_else(|| EngineError::SessionNotFound(session_id.as_str().to_string()))?;
    if !record.status.can_transition_to(next) {
        return Err(EngineError::InvalidTransition {
            session_id: session_id.as_str().to_string(),
            from: record.status.to_string(),
            to: next.to_string(),
        });
    }
    record.status = next;
    Ok(())
}

/// One-shot terminal transition, safe to call from both the natural-exit
/// path and a concurrent explicit terminate — only the first caller acts.
fn mark_terminated_once<C: Clock>(
    sessions: &SessionMap,
    bus: &EventBus<C>,
    clock: &C,
    session_id: &SessionId,
    ended_guard: &AtomicBool,
) {
    if ended_guard.swap(true, Ordering::SeqCst) {
        return;
    }
    if let Some(record) = sessions.lock().get_mut(session_id) {
        if record.status.can_transition_to(SessionStatus::Terminated) {
            record.status = SessionStatus::Terminated;
            record.ended_at_ms = Some(clock.now_ms());
        }
    }
    bus.close(session_id);
}

async fn kill_headless(child: &AsyncMutex<Child>, graceful: bool, grace: Duration) {
    if graceful {
        let pid = child.lock().await.id();
        if let Some(pid) = pid {
            let _ = tokio::process::Command::new("kill")
                .args(["-15", &pid.to_string()])
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
                .await;
            let waited = timeout(grace, async { child.lock().await.wait().await }).await;
            if matches!(waited, Ok(Ok(_))) {
                return;
            }
        }
    }
    let mut guard = child.lock().await;
    let _ = guard.start_kill();
    let _ = guard.wait().await;
}

async fn kill_interactive(
    writer_tx: &mpsc::Sender<Vec<u8>>,
    child: &Mutex<PtyChild>,
    graceful: bool,
    grace: Duration,
) {
    if graceful {
        let _ = writer_tx.send(b"exit\r".to_vec()).await;
        let deadline = tokio::time::Instant::now() + grace;
        loop {
            let exited = matches!(child.lock().try_wait(), Ok(Some(_)));
            if exited {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
    let _ = child.lock().kill();
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
