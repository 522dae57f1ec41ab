// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Triage routing core.
//!
//! Per-request processing never fails: degradations are reported as
//! [`RoutingNote`](crate::types::RoutingNote)s on the decision. The variants
//! below cover startup faults and the few caller mistakes the core rejects.

use thiserror::Error;

/// The primary error type used across Triage crates.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Configuration errors (invalid TOML, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A malformed routing table detected while building the router.
    #[error("routing table error: {0}")]
    RoutingTable(String),

    /// A handler name that is not part of the closed handler set.
    #[error("unknown handler `{name}`")]
    UnknownHandler { name: String },

    /// Session identifiers must be non-empty.
    #[error("session id must not be empty")]
    InvalidSessionId,

    /// Handler execution reported a failure (raised by executors, not the core).
    #[error("handler `{handler}` failed: {message}")]
    Handler { handler: String, message: String },
}
