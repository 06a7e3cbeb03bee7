// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! orc-adapters: capability-detected construction of LLM CLI subprocesses.
//!
//! This crate knows how to build and launch a headless or PTY-backed child
//! process for a given upstream CLI. It does not own supervision — reading
//! the event stream, enforcing the session state machine, or deciding when
//! to kill — that lives in `orc-engine`'s Spawner.

pub mod provider;
pub mod subprocess;

pub use provider::{
    resize, scrape_session_id, AdapterError, AgentProvider, ClaudeCodeProvider, HeadlessChild,
    HeadlessSpawnOpts, InteractiveChild, InteractiveSpawnOpts, PtyDimensions,
};

#[cfg(any(test, feature = "test-support"))]
pub use provider::{FakeProvider, FakeProviderScript};
