// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider for the Claude Code CLI — headless via stream-json stdin/stdout,
//! interactive via a real PTY.

use async_trait::async_trait;

use super::headless::{build_command, spawn_from_command, HeadlessChild, HeadlessSpawnOpts};
use super::interactive::{spawn_pty, InteractiveChild, InteractiveSpawnOpts};
use super::{AdapterError, AgentProvider};
use crate::subprocess::binary_on_path;

const BINARY: &str = "claude";

pub struct ClaudeCodeProvider {
    binary: String,
}

impl ClaudeCodeProvider {
    pub fn new() -> Self {
        Self {
            binary: BINARY.to_string(),
        }
    }

    /// Override the binary name, e.g. for a `claudeless` stand-in in tests
    /// or CI environments without real API access.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn headless_args(&self, opts: &HeadlessSpawnOpts) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--verbose".to_string(),
            "--dangerously-skip-permissions".to_string(),
            "--input-format".to_string(),
            "stream-json".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
        ];
        if let Some(upstream) = &opts.resume_session_id {
            args.push("--resume".to_string());
            args.push(upstream.clone());
        }
        args
    }

    fn interactive_args(&self, opts: &InteractiveSpawnOpts) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(upstream) = &opts.resume_session_id {
            args.push("--resume".to_string());
            args.push(upstream.clone());
        }
        args
    }
}

impl Default for ClaudeCodeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentProvider for ClaudeCodeProvider {
    fn name(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        // Feature-detection must stay synchronous per the provider
        // contract; this uses the blocking `which` lookup rather than the
        // async probe used by the store/dispatch paths.
        std::process::Command::new("which")
            .arg(&self.binary)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn spawn_headless(&self, opts: HeadlessSpawnOpts) -> Result<HeadlessChild, AdapterError> {
        if !binary_on_path(&self.binary).await {
            return Err(AdapterError::NotAvailable(self.binary.clone()));
        }
        let args = self.headless_args(&opts);
        let cmd = build_command(&self.binary, &args, &opts)?;
        spawn_from_command(cmd)
    }

    async fn spawn_interactive(
        &self,
        opts: InteractiveSpawnOpts,
    ) -> Result<InteractiveChild, AdapterError> {
        if !binary_on_path(&self.binary).await {
            return Err(AdapterError::NotAvailable(self.binary.clone()));
        }
        let args = self.interactive_args(&opts);
        spawn_pty(&self.binary, &args, &opts)
    }
}
