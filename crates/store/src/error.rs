// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use orc_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    #[error("store unreachable: {0}")]
    Unreachable(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::TaskNotFound(_) | StoreError::AgentNotFound(_) => ErrorKind::NotFound,
            StoreError::Unreachable(_) => ErrorKind::UpstreamUnavailable,
        }
    }
}
