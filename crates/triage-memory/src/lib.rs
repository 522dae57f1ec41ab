// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-term conversation memory for Triage.
//!
//! [`SessionMemory`] keeps a bounded turn history and the derived context
//! (last intent, last entities, free-form attributes) per session id.
//! Sessions are created lazily and evicted explicitly, by the periodic
//! sweep, or when the session cap is reached.

pub mod store;
pub mod types;

pub use store::SessionMemory;
pub use types::{AppendOutcome, ContextPatch, SessionContext, SessionState, SessionSummary};
