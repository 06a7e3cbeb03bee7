// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logical session identity layered on top of the [`crate::spawner::Spawner`].
//!
//! The Spawner only ever supervises a live process; it has no opinion on
//! where session ids come from or what happened before it was asked to
//! start one. This module mints session ids, keeps a history of past
//! sessions per (agent, role) so a later `resume` can find them, and
//! queues input sent to a session that is still starting instead of
//! rejecting it outright.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use orc_adapters::{AgentProvider, HeadlessSpawnOpts, InteractiveSpawnOpts};
use orc_core::{
    most_recent_resumable, AgentId, AgentRole, Clock, SessionHistoryEntry, SessionId,
    SessionStatus,
};
use orc_store::TaskStore;
use parking_lot::Mutex;

use crate::bus::{EventBus, EventStream};
use crate::error::EngineError;
use crate::ready_queue::{check_ready_queue, ReadyQueueOptions};
use crate::spawner::Spawner;

#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// When no resumable session is found, start a fresh one instead of
    /// failing the `resume` call.
    pub fallback_to_start_on_resume: bool,
    /// Before resuming a worker, refuse unless the ready queue shows at
    /// least one task anchored to it. Has no effect on directors/stewards.
    pub refuse_worker_resume_without_ready_work: bool,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            fallback_to_start_on_resume: true,
            refuse_worker_resume_without_ready_work: false,
        }
    }
}

/// The spawn-time options for a new or resumed session. `options.opts`'s
/// `resume_session_id` is overwritten by [`SessionManager::resume`] once it
/// has found the upstream id to resume from.
pub enum StartOptions {
    Headless {
        opts: HeadlessSpawnOpts,
        initial_turn: serde_json::Value,
    },
    Interactive {
        opts: InteractiveSpawnOpts,
    },
}

impl StartOptions {
    fn working_dir(&self) -> PathBuf {
        match self {
            StartOptions::Headless { opts, .. } => opts.cwd.clone(),
            StartOptions::Interactive { opts } => opts.cwd.clone(),
        }
    }

    fn set_resume_session_id(&mut self, upstream_session_id: Option<String>) {
        match self {
            StartOptions::Headless { opts, .. } => opts.resume_session_id = upstream_session_id,
            StartOptions::Interactive { opts } => opts.resume_session_id = upstream_session_id,
        }
    }
}

type HistoryStore = Mutex<Vec<SessionHistoryEntry>>;
type PendingSends = Mutex<HashMap<SessionId, Vec<serde_json::Value>>>;

pub struct SessionManager<P, C: Clock> {
    spawner: Arc<Spawner<P, C>>,
    bus: Arc<EventBus<C>>,
    clock: C,
    config: SessionManagerConfig,
    history: Arc<HistoryStore>,
    pending_sends: Arc<PendingSends>,
    store: Option<Arc<dyn TaskStore>>,
}

impl<P: AgentProvider, C: Clock> SessionManager<P, C> {
    pub fn new(
        spawner: Arc<Spawner<P, C>>,
        bus: Arc<EventBus<C>>,
        clock: C,
        config: SessionManagerConfig,
        store: Option<Arc<dyn TaskStore>>,
    ) -> Self {
        Self {
            spawner,
            bus,
            clock,
            config,
            history: Arc::new(Mutex::new(Vec::new())),
            pending_sends: Arc::new(Mutex::new(HashMap::new())),
            store,
        }
    }

    /// Rehydrates session-to-upstream-id history after a process restart.
    /// Live sessions are gone (the Spawner starts empty); this only
    /// restores the record a later `resume` needs.
    pub fn rehydrate_history(&self, entries: Vec<SessionHistoryEntry>) {
        self.history.lock().extend(entries);
    }

    pub async fn start(
        &self,
        agent_id: AgentId,
        role: AgentRole,
        options: StartOptions,
    ) -> Result<SessionId, EngineError> {
        let session_id = SessionId::new(uuid::Uuid::new_v4().to_string());
        let working_dir = options.working_dir();
        let created_at_ms = self.clock.now_ms();

        self.history.lock().push(SessionHistoryEntry {
            session_id: session_id.clone(),
            agent_id: agent_id.clone(),
            role,
            status: SessionStatus::Starting,
            working_dir,
            created_at_ms,
            started_at_ms: None,
            ended_at_ms: None,
            upstream_session_id: None,
        });

        let spawner = self.spawner.clone();
        let history = self.history.clone();
        let pending_sends = self.pending_sends.clone();
        let bus = self.bus.clone();
        let clock = self.clock.clone();
        let sid = session_id.clone();

        tokio::spawn(async move {
            let outcome = match options {
                StartOptions::Headless { opts, initial_turn } => {
                    spawner
                        .start_headless(sid.clone(), agent_id, opts, initial_turn)
                        .await
                }
                StartOptions::Interactive { opts } => {
                    spawner.start_interactive(sid.clone(), agent_id, opts).await
                }
            };

            match outcome {
                Ok(_) => {
                    let now = clock.now_ms();
                    let upstream = spawner.upstream_session_id(&sid);
                    update_history(&history, &sid, |entry| {
                        entry.status = SessionStatus::Running;
                        entry.started_at_ms = Some(now);
                        entry.upstream_session_id = upstream;
                    });
                    flush_pending(&spawner, &pending_sends, &sid).await;
                }
                Err(e) => {
                    let now = clock.now_ms();
                    update_history(&history, &sid, |entry| {
                        entry.status = SessionStatus::Terminated;
                        entry.ended_at_ms = Some(now);
                    });
                    fail_pending(&bus, &pending_sends, &sid, &clock, &e.to_string());
                }
            }
        });

        Ok(session_id)
    }

    /// Finds the most recent resumable session for `(agent_id, role)` and
    /// resumes from its upstream id. Falls back to a fresh `start` per
    /// `fallback_to_start_on_resume` when none is found.
    pub async fn resume(
        &self,
        agent_id: AgentId,
        role: AgentRole,
        mut options: StartOptions,
    ) -> Result<SessionId, EngineError> {
        let found = {
            let history = self.history.lock();
            most_recent_resumable(
                history
                    .iter()
                    .filter(|e| e.agent_id == agent_id && e.role == role),
            )
            .cloned()
        };

        match &found {
            Some(entry) => options.set_resume_session_id(entry.upstream_session_id.clone()),
            None if !self.config.fallback_to_start_on_resume => {
                return Err(EngineError::SessionNotFound(format!(
                    "no resumable session for agent {} role {role}",
                    agent_id.as_str()
                )));
            }
            None => {}
        }

        if role == AgentRole::Worker && self.config.refuse_worker_resume_without_ready_work {
            if let Some(store) = &self.store {
                let ready =
                    check_ready_queue(store.as_ref(), &agent_id, ReadyQueueOptions::default())
                        .await?;
                if ready.next_task.is_none() {
                    return Err(EngineError::InvalidState {
                        session_id: agent_id.as_str().to_string(),
                        reason: "no ready work anchored for worker resume".to_string(),
                    });
                }
            }
        }

        self.start(agent_id, role, options).await
    }

    pub async fn stop(&self, session_id: &SessionId, graceful: bool) -> Result<(), EngineError> {
        self.spawner.terminate(session_id, graceful).await?;
        let now = self.clock.now_ms();
        update_history(&self.history, session_id, |entry| {
            entry.status = SessionStatus::Terminated;
            entry.ended_at_ms = Some(now);
        });
        Ok(())
    }

    /// Kills the session's process but keeps its upstream id on record so a
    /// later `resume` can pick it back up, instead of terminating it for
    /// good. Mirrors the status onto the session's history entry so
    /// `most_recent_resumable` sees it as resumable.
    pub async fn suspend(&self, session_id: &SessionId) -> Result<(), EngineError> {
        self.spawner.suspend(session_id).await?;
        update_history(&self.history, session_id, |entry| {
            entry.status = SessionStatus::Suspended;
        });
        Ok(())
    }

    /// Sends `payload` through the Spawner's `send_input`. If the session
    /// is still `starting`, the payload is buffered instead and flushed by
    /// the background task once the session reaches `running` — or failed,
    /// with a descriptive event on the session's stream, if it never does.
    pub async fn send(
        &self,
        session_id: &SessionId,
        payload: serde_json::Value,
    ) -> Result<(), EngineError> {
        match self.spawner.status(session_id) {
            Some(SessionStatus::Running) => self.spawner.send_input(session_id, payload).await,
            Some(SessionStatus::Starting) => {
                self.pending_sends
                    .lock()
                    .entry(session_id.clone())
                    .or_default()
                    .push(payload);
                // The session may have finished starting between the status
                // read above and the enqueue just now; re-check so a send
                // doesn't sit buffered forever behind an already-running
                // session.
                if self.spawner.status(session_id) == Some(SessionStatus::Running) {
                    flush_pending(&self.spawner, &self.pending_sends, session_id).await;
                }
                Ok(())
            }
            Some(other) => Err(EngineError::InvalidState {
                session_id: session_id.as_str().to_string(),
                reason: format!("session is {other}, not running"),
            }),
            None => Err(EngineError::SessionNotFound(session_id.as_str().to_string())),
        }
    }

    pub fn stream(&self, session_id: &SessionId) -> EventStream {
        self.bus.subscribe(session_id)
    }

    pub fn status(&self, session_id: &SessionId) -> Option<SessionStatus> {
        self.spawner.status(session_id)
    }

    pub fn list_active(&self) -> Vec<SessionId> {
        self.spawner.list_active()
    }

    pub fn list_all(&self) -> Vec<SessionId> {
        self.spawner.list_all()
    }

    /// The most recently started session for `agent_id`, active or not —
    /// what `/agents/:id/*` routes resolve against when they only carry an
    /// agent id.
    pub fn session_for_agent(&self, agent_id: &AgentId) -> Option<SessionId> {
        self.spawner.most_recent_for_agent(agent_id)
    }

    pub fn history(&self, agent_id: &AgentId, role: AgentRole) -> Vec<SessionHistoryEntry> {
        let mut entries: Vec<SessionHistoryEntry> = self
            .history
            .lock()
            .iter()
            .filter(|e| &e.agent_id == agent_id && e.role == role)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        entries
    }
}

fn update_history(
    history: &HistoryStore,
    session_id: &SessionId,
    f: impl FnOnce(&mut SessionHistoryEntry),
) {
    if let Some(entry) = history
        .lock()
        .iter_mut()
        .find(|e| &e.session_id == session_id)
    {
        f(entry);
    }
}

async fn flush_pending<P: AgentProvider, C: Clock>(
    spawner: &Spawner<P, C>,
    pending_sends: &PendingSends,
    session_id: &SessionId,
) {
    let queued = pending_sends.lock().remove(session_id).unwrap_or_default();
    for payload in queued {
        if let Err(e) = spawner.send_input(session_id, payload).await {
            tracing::warn!(session_id = %session_id.as_str(), error = %e, "failed to flush queued send");
        }
    }
}

fn fail_pending<C: Clock>(
    bus: &EventBus<C>,
    pending_sends: &PendingSends,
    session_id: &SessionId,
    clock: &C,
    reason: &str,
) {
    let queued = pending_sends.lock().remove(session_id).unwrap_or_default();
    if queued.is_empty() {
        return;
    }
    let message = format!("session never reached running: {reason}");
    bus.publish(
        session_id,
        orc_core::SessionEvent::pending_send_failed(message, clock.now_ms()),
    );
}

#[cfg(test)]
#[path = "session_manager_tests.rs"]
mod tests;
