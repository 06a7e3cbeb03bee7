// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier type.
//!
//! `SessionId` is assigned internally on every spawn and is distinct from the
//! `AgentId` it is bound to (an agent may own many sequential sessions) and
//! from the upstream session id the subprocess reports in its init event
//! (used to resume a prior conversation across restarts).

crate::define_id! {
    /// Internal identifier for one live or historical agent session.
    pub struct SessionId;
}
