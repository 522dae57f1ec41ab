// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session domain types.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use triage_core::{RequestCategory, Turn};

/// Lifecycle of a session: `Created -> Active -> Evicted`.
///
/// The operation that brings a session into existence (first append or
/// context update) leaves it `Created`; each later append makes it `Active`.
///
/// An evicted session is gone for good; the same id later starts a new
/// `Created` session with nothing carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Started by the current operation; nothing appended before it.
    Created,
    /// Appended to at least once after creation.
    Active,
    /// Removed from the store.
    Evicted,
}

/// Everything remembered about one conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionContext {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Turns appended over the session's lifetime, including evicted ones.
    pub message_count: u64,
    pub last_entities: Vec<String>,
    pub last_intent: Option<RequestCategory>,
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub state: SessionState,
    /// Most recent turns, oldest first, bounded by the store's capacity.
    pub history: VecDeque<Turn>,
}

impl SessionContext {
    pub(crate) fn new(session_id: &str, capacity: usize, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.to_string(),
            created_at: now,
            last_activity: now,
            message_count: 0,
            last_entities: Vec::new(),
            last_intent: None,
            attributes: BTreeMap::new(),
            state: SessionState::Created,
            history: VecDeque::with_capacity(capacity),
        }
    }

    /// The parts of the context worth attaching to a routing decision.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            state: self.state,
            message_count: self.message_count,
            last_intent: self.last_intent,
            last_entities: self.last_entities.clone(),
        }
    }
}

/// Compact view of a session without its history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub state: SessionState,
    pub message_count: u64,
    pub last_intent: Option<RequestCategory>,
    pub last_entities: Vec<String>,
}

/// Partial update merged into a session, last write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextPatch {
    pub last_intent: Option<RequestCategory>,
    pub last_entities: Option<Vec<String>>,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intent(mut self, category: RequestCategory) -> Self {
        self.last_intent = Some(category);
        self
    }

    pub fn entities(mut self, entities: Vec<String>) -> Self {
        self.last_entities = Some(entities);
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub(crate) fn apply(self, context: &mut SessionContext) {
        if let Some(intent) = self.last_intent {
            context.last_intent = Some(intent);
        }
        if let Some(entities) = self.last_entities {
            context.last_entities = entities;
        }
        context.attributes.extend(self.attributes);
    }
}

/// Result of appending a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// True when this append started a new session.
    pub created: bool,
    pub message_count: u64,
    /// Turns currently held in the ring buffer.
    pub history_len: usize,
}
