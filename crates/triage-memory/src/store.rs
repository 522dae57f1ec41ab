// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session store.
//!
//! Sessions live in a sharded [`DashMap`], each behind its own mutex, so
//! operations on one session serialize while different sessions never
//! contend. The map guard is always released before a session mutex is
//! taken. A session removed while another task waited on its mutex is
//! flagged [`SessionState::Evicted`]; the waiter sees the flag and retries
//! against a fresh entry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};
use triage_config::model::SessionConfig;
use triage_core::{TriageError, Turn};

use crate::types::{AppendOutcome, ContextPatch, SessionContext, SessionState, SessionSummary};

/// Default ring buffer capacity per session.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Default soft cap on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// `try_lock` attempts before falling back to a blocking lock.
const SPIN_LIMIT: u32 = 64;

type Slot = Arc<Mutex<SessionContext>>;

/// Bounded per-session conversation memory.
#[derive(Debug)]
pub struct SessionMemory {
    sessions: DashMap<String, Slot>,
    history_capacity: usize,
    max_sessions: usize,
}

impl SessionMemory {
    pub fn new(history_capacity: usize, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            history_capacity: history_capacity.max(1),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.history_capacity, config.max_sessions)
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Append a turn, creating the session on first use.
    ///
    /// The oldest turn is dropped once the history is at capacity.
    pub fn append(&self, session_id: &str, turn: Turn) -> Result<AppendOutcome, TriageError> {
        self.append_with_context(session_id, turn, ContextPatch::default())
            .map(|(outcome, _)| outcome)
    }

    /// Append a turn and merge `patch` under one lock, returning the
    /// resulting summary.
    pub fn append_with_context(
        &self,
        session_id: &str,
        turn: Turn,
        patch: ContextPatch,
    ) -> Result<(AppendOutcome, SessionSummary), TriageError> {
        let capacity = self.history_capacity;
        self.with_session_or_create(session_id, |context, created| {
            if context.history.len() == capacity {
                context.history.pop_front();
            }
            context.history.push_back(turn);
            context.message_count += 1;
            patch.apply(context);
            context.last_activity = Utc::now();
            if !created {
                context.state = SessionState::Active;
            }
            let outcome = AppendOutcome {
                created,
                message_count: context.message_count,
                history_len: context.history.len(),
            };
            (outcome, context.summary())
        })
    }

    /// At most `limit` most recent turns, oldest first.
    ///
    /// An unknown session has an empty history.
    pub fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<Turn>, TriageError> {
        Ok(self
            .with_existing(session_id, |context| {
                let skip = context.history.len().saturating_sub(limit);
                context.history.iter().skip(skip).cloned().collect()
            })?
            .unwrap_or_default())
    }

    /// Snapshot of a session, `None` when the id is unknown.
    pub fn get_context(&self, session_id: &str) -> Result<Option<SessionContext>, TriageError> {
        self.with_existing(session_id, |context| context.clone())
    }

    /// Merge `patch` into the session, creating it if needed.
    ///
    /// Returns true when the session was created by this call.
    pub fn update_context(&self, session_id: &str, patch: ContextPatch) -> Result<bool, TriageError> {
        self.with_session_or_create(session_id, |context, created| {
            patch.apply(context);
            context.last_activity = Utc::now();
            created
        })
    }

    /// Remove a session. Returns false when it did not exist.
    pub fn evict(&self, session_id: &str) -> bool {
        let Some((_, slot)) = self.sessions.remove(session_id) else {
            return false;
        };
        lock_slot(&slot).state = SessionState::Evicted;
        info!(session_id, "session evicted");
        true
    }

    /// Evict every session idle for longer than `max_age`.
    pub fn sweep(&self, max_age: Duration) -> usize {
        self.sweep_at(Utc::now(), max_age)
    }

    /// [`sweep`](Self::sweep) against an explicit clock.
    ///
    /// Sessions locked by a concurrent operation are in use and are skipped.
    pub fn sweep_at(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let Some(cutoff) = TimeDelta::from_std(max_age)
            .ok()
            .and_then(|age| now.checked_sub_signed(age))
        else {
            return 0;
        };

        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .try_lock()
                    .is_ok_and(|context| context.last_activity < cutoff)
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for session_id in stale {
            // Re-check under the shard lock: the session may have been touched since.
            let removed = self.sessions.remove_if(&session_id, |_, slot| match slot.try_lock() {
                Ok(mut context) if context.last_activity < cutoff => {
                    context.state = SessionState::Evicted;
                    true
                }
                _ => false,
            });
            if removed.is_some() {
                evicted += 1;
            }
        }

        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "session sweep completed");
        } else {
            debug!(remaining = self.sessions.len(), "session sweep found nothing to evict");
        }
        evicted
    }

    fn with_existing<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut SessionContext) -> R,
    ) -> Result<Option<R>, TriageError> {
        validate_id(session_id)?;
        loop {
            let Some(slot) = self.sessions.get(session_id).map(|s| Arc::clone(s.value())) else {
                return Ok(None);
            };
            let mut context = lock_slot(&slot);
            if context.state != SessionState::Evicted {
                return Ok(Some(f(&mut context)));
            }
        }
    }

    fn with_session_or_create<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut SessionContext, bool) -> R,
    ) -> Result<R, TriageError> {
        validate_id(session_id)?;
        loop {
            let (slot, created) = self.slot_or_create(session_id);
            let mut context = lock_slot(&slot);
            if context.state != SessionState::Evicted {
                if created {
                    info!(session_id, "session created");
                }
                return Ok(f(&mut context, created));
            }
        }
    }

    fn slot_or_create(&self, session_id: &str) -> (Slot, bool) {
        if let Some(slot) = self.sessions.get(session_id) {
            return (Arc::clone(slot.value()), false);
        }
        if self.sessions.len() >= self.max_sessions {
            self.evict_stalest();
        }
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let slot = Arc::new(Mutex::new(SessionContext::new(
                    session_id,
                    self.history_capacity,
                    Utc::now(),
                )));
                entry.insert(Arc::clone(&slot));
                (slot, true)
            }
        }
    }

    /// Make room under the session cap by evicting the least recently
    /// active idle session.
    fn evict_stalest(&self) {
        let stalest = self
            .sessions
            .iter()
            .filter_map(|entry| {
                let last_activity = entry.value().try_lock().ok()?.last_activity;
                Some((entry.key().clone(), last_activity))
            })
            .min_by_key(|(_, last_activity)| *last_activity);

        if let Some((session_id, last_activity)) = stalest {
            warn!(
                session_id = session_id.as_str(),
                %last_activity,
                max_sessions = self.max_sessions,
                "session cap reached, evicting least recently active session"
            );
            self.evict(&session_id);
        }
    }
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_SESSIONS)
    }
}

fn validate_id(session_id: &str) -> Result<(), TriageError> {
    if session_id.trim().is_empty() {
        return Err(TriageError::InvalidSessionId);
    }
    Ok(())
}

/// Lock a session, spinning briefly before blocking.
///
/// A poisoned mutex only means another caller panicked mid-update; the
/// context is still structurally valid, so the guard is recovered.
fn lock_slot(slot: &Mutex<SessionContext>) -> MutexGuard<'_, SessionContext> {
    for _ in 0..SPIN_LIMIT {
        match slot.try_lock() {
            Ok(guard) => return guard,
            Err(TryLockError::Poisoned(poisoned)) => return poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => std::hint::spin_loop(),
        }
    }
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
