// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double for [`AgentProvider`]. Spawns real but trivial child
//! processes (so `HeadlessChild`/`InteractiveChild` stay honest about their
//! OS-backed fields) while recording every call and allowing error
//! injection, mirroring the adapter fakes used elsewhere in this workspace.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::headless::{spawn_from_command, HeadlessChild, HeadlessSpawnOpts};
use super::interactive::{spawn_pty, InteractiveChild, InteractiveSpawnOpts};
use super::{AdapterError, AgentProvider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeProviderCall {
    SpawnHeadless,
    SpawnInteractive,
}

#[derive(Default)]
struct FakeProviderState {
    calls: Vec<FakeProviderCall>,
    spawn_headless_error: Option<String>,
    spawn_interactive_error: Option<String>,
    available: bool,
}

/// Pre-programmed failures for a [`FakeProvider`], set up before handing it
/// to code under test.
#[derive(Default, Clone)]
pub struct FakeProviderScript {
    pub spawn_headless_error: Option<String>,
    pub spawn_interactive_error: Option<String>,
    pub available: bool,
}

pub struct FakeProvider {
    name: String,
    state: Arc<Mutex<FakeProviderState>>,
}

impl FakeProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(FakeProviderState {
                available: true,
                ..Default::default()
            })),
        }
    }

    pub fn with_script(name: impl Into<String>, script: FakeProviderScript) -> Self {
        let provider = Self::new(name);
        {
            let mut state = provider.state.lock().unwrap();
            state.spawn_headless_error = script.spawn_headless_error;
            state.spawn_interactive_error = script.spawn_interactive_error;
            state.available = script.available;
        }
        provider
    }

    pub fn calls(&self) -> Vec<FakeProviderCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().available = available;
    }
}

#[async_trait]
impl AgentProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.state.lock().unwrap().available
    }

    async fn spawn_headless(
        &self,
        opts: HeadlessSpawnOpts,
    ) -> Result<HeadlessChild, AdapterError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(FakeProviderCall::SpawnHeadless);
        if let Some(err) = self.state.lock().unwrap().spawn_headless_error.clone() {
            return Err(AdapterError::SpawnFailed(err));
        }
        let mut cmd = tokio::process::Command::new("cat");
        cmd.current_dir(&opts.cwd)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);
        spawn_from_command(cmd)
    }

    async fn spawn_interactive(
        &self,
        opts: InteractiveSpawnOpts,
    ) -> Result<InteractiveChild, AdapterError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(FakeProviderCall::SpawnInteractive);
        if let Some(err) = self.state.lock().unwrap().spawn_interactive_error.clone() {
            return Err(AdapterError::SpawnFailed(err));
        }
        spawn_pty("cat", &[], &opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn headless_opts() -> HeadlessSpawnOpts {
        HeadlessSpawnOpts {
            cwd: PathBuf::from("."),
            env: HashMap::new(),
            resume_session_id: None,
        }
    }

    #[tokio::test]
    async fn records_spawn_headless_calls() {
        let provider = FakeProvider::new("fake");
        let mut child = provider.spawn_headless(headless_opts()).await.unwrap();
        assert_eq!(provider.calls(), vec![FakeProviderCall::SpawnHeadless]);
        drop(child.stdin);
        let _ = child.child.wait().await;
    }

    #[tokio::test]
    async fn injected_error_surfaces_to_caller() {
        let script = FakeProviderScript {
            spawn_headless_error: Some("boom".to_string()),
            available: true,
            ..Default::default()
        };
        let provider = FakeProvider::with_script("fake", script);
        let err = provider.spawn_headless(headless_opts()).await.unwrap_err();
        assert!(matches!(err, AdapterError::SpawnFailed(msg) if msg == "boom"));
    }

    #[test]
    fn availability_is_controllable() {
        let provider = FakeProvider::new("fake");
        assert!(provider.is_available());
        provider.set_available(false);
        assert!(!provider.is_available());
    }
}
