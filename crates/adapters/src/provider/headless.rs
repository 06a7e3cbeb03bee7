// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Headless (pipe-based, line-delimited JSON) subprocess construction.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::io::{BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};

use super::AdapterError;

/// Everything needed to launch one headless session.
#[derive(Debug, Clone)]
pub struct HeadlessSpawnOpts {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    /// Opaque upstream session id to resume, if this is a resume-start.
    pub resume_session_id: Option<String>,
}

/// A live headless child: the Spawner reads `stdout_lines` and writes
/// JSON messages to `stdin`. Dropping this drops the `Child` and kills it
/// unless it has already exited.
#[derive(Debug)]
pub struct HeadlessChild {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout_lines: Lines<BufReader<ChildStdout>>,
}

/// Builds the `tokio::process::Command` for a headless launch of `binary`
/// with the given args, wiring stdin/stdout as pipes and stderr as
/// inherited (so crash diagnostics land in the daemon's own log).
///
/// Per the agent-process interface, the initial prompt is never a CLI
/// argument in headless mode — it is delivered as the first stdin message
/// by the Spawner after this child is constructed.
pub fn build_command(
    binary: &str,
    args: &[String],
    opts: &HeadlessSpawnOpts,
) -> Result<tokio::process::Command, AdapterError> {
    if !opts.cwd.is_dir() {
        return Err(AdapterError::MissingCwd(opts.cwd.display().to_string()));
    }
    let mut cmd = tokio::process::Command::new(binary);
    cmd.args(args)
        .current_dir(&opts.cwd)
        .envs(&opts.env)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::inherit())
        .kill_on_drop(true);
    Ok(cmd)
}

pub fn spawn_from_command(
    mut cmd: tokio::process::Command,
) -> Result<HeadlessChild, AdapterError> {
    let mut child = cmd
        .spawn()
        .map_err(|e| AdapterError::SpawnFailed(e.to_string()))?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AdapterError::SpawnFailed("child has no stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AdapterError::SpawnFailed("child has no stdout".into()))?;
    let stdout_lines = tokio::io::AsyncBufReadExt::lines(BufReader::new(stdout));
    Ok(HeadlessChild {
        child,
        stdin,
        stdout_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cwd_is_rejected_before_spawn() {
        let opts = HeadlessSpawnOpts {
            cwd: PathBuf::from("/definitely/not/a/real/path"),
            env: HashMap::new(),
            resume_session_id: None,
        };
        let err = build_command("cat", &[], &opts).unwrap_err();
        assert!(matches!(err, AdapterError::MissingCwd(_)));
    }

    #[tokio::test]
    async fn spawns_a_real_child_with_piped_stdio() {
        let opts = HeadlessSpawnOpts {
            cwd: PathBuf::from("."),
            env: HashMap::new(),
            resume_session_id: None,
        };
        let cmd = build_command("cat", &[], &opts).unwrap();
        let mut child = spawn_from_command(cmd).unwrap();
        drop(child.stdin);
        let _ = child.child.wait().await;
    }
}
