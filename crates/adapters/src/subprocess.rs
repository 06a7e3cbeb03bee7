// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers shared by the headless and PTY providers.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// How long `is_available()`-style probes (e.g. `which <binary>`) may take.
pub const AVAILABILITY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the init handshake may take before the Spawner gives up and
/// reports a `SpawnFailure`.
pub const INIT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a graceful-stop request gets before the Spawner escalates to kill.
pub const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(15);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Cheap, synchronous-feeling check for whether a binary is on PATH.
pub async fn binary_on_path(binary: &str) -> bool {
    let mut cmd = Command::new("which");
    cmd.arg(binary);
    matches!(
        run_with_timeout(cmd, AVAILABILITY_PROBE_TIMEOUT, "which").await,
        Ok(output) if output.status.success()
    )
}
