// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session memory behaviour through the public API.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use proptest::prelude::*;
use triage_config::load_and_validate_str;
use triage_core::{RequestCategory, Turn};
use triage_memory::{ContextPatch, SessionMemory, SessionState};

proptest! {
    #[test]
    fn history_is_the_most_recent_window(capacity in 1usize..16, appended in 0usize..64, limit in 0usize..20) {
        let memory = SessionMemory::new(capacity, 4);
        for i in 0..appended {
            memory.append("s", Turn::user(i.to_string())).unwrap();
        }
        let history = memory.get_history("s", limit).unwrap();
        let expected_len = appended.min(capacity).min(limit);
        prop_assert_eq!(history.len(), expected_len);
        let expected: Vec<String> = (appended - expected_len..appended).map(|i| i.to_string()).collect();
        let actual: Vec<String> = history.into_iter().map(|t| t.content).collect();
        prop_assert_eq!(actual, expected);
    }
}

#[test]
fn configured_capacity_is_enforced() {
    let config = load_and_validate_str("[session]\nhistory_capacity = 2\n").unwrap();
    let memory = SessionMemory::from_config(&config.session);
    for text in ["một", "hai", "ba"] {
        memory.append("s", Turn::user(text)).unwrap();
    }
    let history = memory.get_history("s", 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "hai");
}

#[test]
fn first_append_creates_and_second_activates() {
    let memory = SessionMemory::default();

    let (outcome, summary) = memory
        .append_with_context("s", Turn::user("giá bàn F42"), ContextPatch::new())
        .unwrap();
    assert!(outcome.created);
    assert_eq!(summary.state, SessionState::Created);
    assert_eq!(
        memory.get_context("s").unwrap().unwrap().state,
        SessionState::Created
    );

    let outcome = memory.append("s", Turn::assistant("2 triệu")).unwrap();
    assert!(!outcome.created);
    assert_eq!(
        memory.get_context("s").unwrap().unwrap().state,
        SessionState::Active
    );
}

#[test]
fn lifecycle_created_active_evicted() {
    let memory = SessionMemory::default();
    memory
        .update_context("s", ContextPatch::new().intent(RequestCategory::Support))
        .unwrap();
    assert_eq!(
        memory.get_context("s").unwrap().unwrap().state,
        SessionState::Created
    );

    memory.append("s", Turn::user("máy không hoạt động")).unwrap();
    let context = memory.get_context("s").unwrap().unwrap();
    assert_eq!(context.state, SessionState::Active);
    assert_eq!(context.summary().last_intent, Some(RequestCategory::Support));

    let swept = memory.sweep_at(Utc::now() + TimeDelta::hours(2), Duration::from_secs(1800));
    assert_eq!(swept, 1);
    assert!(memory.get_context("s").unwrap().is_none());
}

#[test]
fn sessions_are_isolated() {
    let memory = SessionMemory::default();
    memory.append("a", Turn::user("for a")).unwrap();
    memory.append("b", Turn::user("for b")).unwrap();
    memory.evict("a");
    assert_eq!(memory.get_history("b", 5).unwrap()[0].content, "for b");
    assert_eq!(memory.len(), 1);
}
