// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PTY-backed interactive subprocess construction.
//!
//! The interactive protocol forwards bytes opaquely; the only structured
//! information the parent extracts is a best-effort "Session: <id>" scrape
//! from the child's output, done by the caller against `reader`.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::OnceLock;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use regex::Regex;

use super::AdapterError;

#[derive(Debug, Clone, Copy)]
pub struct PtyDimensions {
    pub rows: u16,
    pub cols: u16,
}

impl Default for PtyDimensions {
    fn default() -> Self {
        Self { rows: 30, cols: 120 }
    }
}

#[derive(Debug, Clone)]
pub struct InteractiveSpawnOpts {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    pub dimensions: PtyDimensions,
    pub resume_session_id: Option<String>,
}

/// A live PTY session. `writer` accepts raw bytes typed by the operator or
/// forwarded through the message API; `reader` yields the terminal's
/// combined stdout/stderr stream verbatim.
pub struct InteractiveChild {
    pub child: Box<dyn Child + Send + Sync>,
    pub writer: Box<dyn Write + Send>,
    pub reader: Box<dyn Read + Send>,
    pub master: Box<dyn MasterPty + Send>,
}

impl std::fmt::Debug for InteractiveChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveChild").finish_non_exhaustive()
    }
}

/// Resize a live PTY. Failures (e.g. the PTY already closed) are reported
/// as an error so the caller can downgrade them to a warning rather than
/// propagating a hard failure — resize is best-effort.
pub fn resize(master: &dyn MasterPty, dimensions: PtyDimensions) -> Result<(), AdapterError> {
    master
        .resize(PtySize {
            rows: dimensions.rows,
            cols: dimensions.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| AdapterError::Pty(e.to_string()))
}

pub fn spawn_pty(
    binary: &str,
    args: &[String],
    opts: &InteractiveSpawnOpts,
) -> Result<InteractiveChild, AdapterError> {
    if !opts.cwd.is_dir() {
        return Err(AdapterError::MissingCwd(opts.cwd.display().to_string()));
    }
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: opts.dimensions.rows,
            cols: opts.dimensions.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| AdapterError::Pty(e.to_string()))?;

    // The PTY's direct child is a login shell, not the provider binary
    // itself — the operator lands in a real shell session with the
    // provider CLI as its first command, exactly as if they'd typed it.
    let login_shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    let mut command_line = shell_quote(binary);
    for arg in args {
        command_line.push(' ');
        command_line.push_str(&shell_quote(arg));
    }

    let mut cmd = CommandBuilder::new(&login_shell);
    cmd.arg("-l");
    cmd.arg("-c");
    cmd.arg(&command_line);
    cmd.cwd(&opts.cwd);
    for (key, value) in &opts.env {
        cmd.env(key, value);
    }

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| AdapterError::SpawnFailed(e.to_string()))?;
    drop(pair.slave);

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| AdapterError::Pty(e.to_string()))?;
    let writer = pair
        .master
        .take_writer()
        .map_err(|e| AdapterError::Pty(e.to_string()))?;

    Ok(InteractiveChild {
        child,
        writer,
        reader,
        master: pair.master,
    })
}

/// Quotes a single shell word for safe use inside a `-c` command line.
/// Plain identifiers, flags and paths pass through unquoted for
/// readability in logs; anything else gets single-quoted the POSIX way.
fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c))
    {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

fn session_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Session:\s*(\S+)").expect("static pattern is valid"))
}

/// Scrapes a best-effort `Session: <id>` token from one line of terminal
/// output. Returns `None` when the line carries no recognizable marker —
/// this is a heuristic, not a protocol, since the interactive path has no
/// structured out-of-band channel.
pub fn scrape_session_id(line: &str) -> Option<String> {
    session_id_pattern()
        .captures(line)
        .map(|caps| caps[1].to_string())
}
