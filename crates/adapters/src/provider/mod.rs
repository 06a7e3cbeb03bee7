// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process-creation seam between the Spawner and a concrete LLM CLI.
//!
//! Modeled as a capability interface, so a CLI without local credentials or
//! network access can be swapped in without touching the Spawner: absence
//! of a binary is reported by
//! [`AgentProvider::is_available`] rather than discovered as a runtime
//! spawn failure. The Spawner (in `orc-engine`) owns the actual subprocess
//! supervision loop — reading stdout lines, writing stdin, enforcing
//! timeouts, and killing on terminate; a provider only knows how to build
//! and launch the right command or PTY session.

mod claude;
mod headless;
mod interactive;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use claude::ClaudeCodeProvider;
pub use headless::{HeadlessChild, HeadlessSpawnOpts};
pub use interactive::{
    resize, scrape_session_id, InteractiveChild, InteractiveSpawnOpts, PtyDimensions,
};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProvider, FakeProviderCall, FakeProviderScript};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("provider binary not found: {0}")]
    NotAvailable(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("working directory does not exist: {0}")]
    MissingCwd(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("pty error: {0}")]
    Pty(String),
}

/// A provider of one LLM CLI. One process per session; many sessions may
/// share a provider instance, which must therefore be `Sync`.
#[async_trait]
pub trait AgentProvider: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Cheap, synchronous feature-detection — e.g. `which` on the binary.
    /// Interactive mode additionally requires PTY allocation to succeed,
    /// which is only known at spawn time and is reported as a `SpawnFailure`.
    fn is_available(&self) -> bool;

    async fn spawn_headless(&self, opts: HeadlessSpawnOpts) -> Result<HeadlessChild, AdapterError>;

    async fn spawn_interactive(
        &self,
        opts: InteractiveSpawnOpts,
    ) -> Result<InteractiveChild, AdapterError>;
}
