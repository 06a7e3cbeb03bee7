// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session status finite state machine.
//!
//! Transitions are enforced centrally through [`SessionStatus::can_transition_to`]
//! so every caller (the spawner's exit handlers, graceful/forced terminate,
//! suspend) goes through the same table rather than re-deriving it.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Starting,
    Running,
    Suspended,
    Terminating,
    Terminated,
}

impl SessionStatus {
    /// Allowed outgoing edges for this status. `Terminated` has none — it is final.
    pub fn allowed_next(self) -> &'static [SessionStatus] {
        use SessionStatus::*;
        match self {
            Starting => &[Running, Terminated],
            Running => &[Suspended, Terminating, Terminated],
            Suspended => &[Running, Terminated],
            Terminating => &[Terminated],
            Terminated => &[],
        }
    }

    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Terminated)
    }

    /// Only `Running` sessions accept input.
    pub fn accepts_input(self) -> bool {
        matches!(self, SessionStatus::Running)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Starting => "starting",
            SessionStatus::Running => "running",
            SessionStatus::Suspended => "suspended",
            SessionStatus::Terminating => "terminating",
            SessionStatus::Terminated => "terminated",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
