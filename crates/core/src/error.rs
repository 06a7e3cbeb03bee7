// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy.
//!
//! This is a classification, not a type hierarchy: each crate boundary
//! defines its own `thiserror` enum for its own failure modes and exposes a
//! `kind() -> ErrorKind` accessor so the daemon and CLI can map any error to
//! an HTTP status / exit code without re-deriving the taxonomy per call site.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InvalidTransition,
    Timeout,
    SpawnFailure,
    ParseFailure,
    ResourceExhausted,
    UpstreamUnavailable,
    Conflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Timeout => "timeout",
            ErrorKind::SpawnFailure => "spawn_failure",
            ErrorKind::ParseFailure => "parse_failure",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::Conflict => "conflict",
        };
        write!(f, "{s}")
    }
}

impl ErrorKind {
    /// Operator CLI exit code.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::NotFound => 3,
            ErrorKind::InvalidState | ErrorKind::InvalidTransition => 4,
            ErrorKind::Timeout
            | ErrorKind::SpawnFailure
            | ErrorKind::ParseFailure
            | ErrorKind::ResourceExhausted
            | ErrorKind::UpstreamUnavailable
            | ErrorKind::Conflict => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_exit_code_3() {
        assert_eq!(ErrorKind::NotFound.exit_code(), 3);
    }

    #[test]
    fn validation_kinds_map_to_exit_code_4() {
        assert_eq!(ErrorKind::InvalidState.exit_code(), 4);
        assert_eq!(ErrorKind::InvalidTransition.exit_code(), 4);
    }

    #[test]
    fn general_errors_map_to_exit_code_1() {
        for kind in [
            ErrorKind::Timeout,
            ErrorKind::SpawnFailure,
            ErrorKind::ParseFailure,
            ErrorKind::ResourceExhausted,
            ErrorKind::UpstreamUnavailable,
            ErrorKind::Conflict,
        ] {
            assert_eq!(kind.exit_code(), 1);
        }
    }
}
