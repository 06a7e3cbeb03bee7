// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch Daemon: ticks against the task store, matching ready tasks to
//! idle workers and assigning them atomically.
//!
//! Readiness is the store's responsibility — the daemon treats
//! `get_ready_tasks` as a black box and never second-guesses it. Back-off
//! doubles on store-unreachable ticks up to `max_backoff`, and resets to
//! `tick_interval` the moment the store answers again, whether or not that
//! tick found work.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orc_core::TaskRequirements;
use orc_store::{AssignMeta, AssignOutcome, TaskStore};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::matcher::{best_match, Candidate};

#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub tick_interval: Duration,
    pub batch_size: usize,
    pub max_backoff: Duration,
    pub store_call_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            batch_size: 16,
            max_backoff: Duration::from_secs(60),
            store_call_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
struct DispatchCounters {
    assigned: AtomicU64,
    conflicts: AtomicU64,
    failed_ticks: AtomicU64,
}

/// A point-in-time snapshot of [`DispatchDaemon::stats`]'s counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DispatchStats {
    pub assigned: u64,
    pub conflicts: u64,
    pub failed_ticks: u64,
}

/// Runs the tick loop on a background task for as long as the daemon is
/// alive; `stop` signals it to exit at the next natural boundary.
pub struct DispatchDaemon {
    counters: Arc<DispatchCounters>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
    poll_tx: mpsc::Sender<oneshot::Sender<()>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DispatchDaemon {
    pub fn spawn(store: Arc<dyn TaskStore>, config: DispatchConfig) -> Self {
        let counters = Arc::new(DispatchCounters::default());
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let (poll_tx, mut poll_rx) = mpsc::channel::<oneshot::Sender<()>>(8);

        let task_counters = counters.clone();
        let handle = tokio::spawn(async move {
            let mut backoff = config.tick_interval;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    ack = poll_rx.recv() => {
                        let ok = run_tick(store.as_ref(), &config, &task_counters).await;
                        backoff = next_backoff(ok, config.tick_interval, config.max_backoff, backoff);
                        if let Some(ack) = ack {
                            let _ = ack.send(());
                        }
                    }
                    _ = tokio::time::sleep(backoff) => {
                        let ok = run_tick(store.as_ref(), &config, &task_counters).await;
                        backoff = next_backoff(ok, config.tick_interval, config.max_backoff, backoff);
                    }
                }
            }
        });

        Self {
            counters,
            stop_tx: Mutex::new(Some(stop_tx)),
            poll_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Runs one tick immediately and waits for it to finish, instead of
    /// waiting for the next scheduled one.
    pub async fn poll_now(&self) {
        let (tx, rx) = oneshot::channel();
        if self.poll_tx.send(tx).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Signals the loop to exit at its next natural boundary and waits for
    /// it; never kills an in-flight store call.
    pub async fn stop(&self) {
        if let Some(tx) = self.stop_tx.lock().take() {
            let _ = tx.send(());
        }
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            assigned: self.counters.assigned.load(Ordering::Relaxed),
            conflicts: self.counters.conflicts.load(Ordering::Relaxed),
            failed_ticks: self.counters.failed_ticks.load(Ordering::Relaxed),
        }
    }
}

fn next_backoff(tick_ok: bool, base: Duration, max: Duration, current: Duration) -> Duration {
    if tick_ok {
        base
    } else {
        (current * 2).min(max)
    }
}

/// Runs `fut` with a deadline. On timeout this logs and returns `None`
/// rather than propagating — callers treat it exactly like a failed store
/// call, so a wedged store backs off the tick loop instead of hanging it.
async fn with_store_timeout<T>(
    timeout: Duration,
    label: &'static str,
    fut: impl std::future::Future<Output = Result<T, orc_store::StoreError>>,
) -> Option<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(label, error = %e, "dispatch tick: store call failed");
            None
        }
        Err(_) => {
            tracing::warn!(label, timeout_secs = timeout.as_secs(), "dispatch tick: store call timed out");
            None
        }
    }
}

/// One pass over ready tasks and idle workers. Returns `false` if the store
/// was unreachable or timed out this tick (triggering back-off), `true`
/// otherwise — including the "found nothing to do" case, which still
/// ticks normally.
async fn run_tick(store: &dyn TaskStore, config: &DispatchConfig, counters: &DispatchCounters) -> bool {
    let timeout = config.store_call_timeout;

    let Some(ready) =
        with_store_timeout(timeout, "get_ready_tasks", store.get_ready_tasks(config.batch_size)).await
    else {
        counters.failed_ticks.fetch_add(1, Ordering::Relaxed);
        return false;
    };
    if ready.is_empty() {
        return true;
    }

    let Some(mut idle) = with_store_timeout(timeout, "get_idle_workers", store.get_idle_workers()).await
    else {
        counters.failed_ticks.fetch_add(1, Ordering::Relaxed);
        return false;
    };

    for task in &ready {
        if idle.is_empty() {
            break;
        }
        let requirements = TaskRequirements {
            required: task.required.clone(),
            preferred: task.preferred.clone(),
        };
        let candidates: Vec<Candidate> = idle
            .iter()
            .map(|w| Candidate {
                agent_id: w.agent_id.clone(),
                capabilities: w.capabilities.clone(),
                currently_assigned_count: w.currently_assigned_count,
            })
            .collect();
        let Some(best) = best_match(&requirements, &candidates) else {
            continue;
        };
        let agent_id = best.agent_id.clone();

        let outcome = with_store_timeout(
            timeout,
            "assign_task_atomic",
            store.assign_task_atomic(&task.task_id, &agent_id, AssignMeta::default()),
        )
        .await;

        match outcome {
            Some(AssignOutcome::Ok) => {
                counters.assigned.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    task_id = %task.task_id.as_str(),
                    agent_id = %agent_id.as_str(),
                    "dispatch: assigned task"
                );
                idle.retain(|w| w.agent_id != agent_id);
            }
            Some(AssignOutcome::Conflict) => {
                counters.conflicts.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(task_id = %task.task_id.as_str(), "dispatch: assignment conflict, skipping");
            }
            None => {
                counters.failed_ticks.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
