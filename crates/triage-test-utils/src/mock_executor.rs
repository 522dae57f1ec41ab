// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock handler executor for deterministic testing.
//!
//! `MockExecutor` implements `HandlerExecutor` with pre-configured replies,
//! per-handler failures and an optional delay, and records every call.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use triage_core::{HandlerKind, Request, TriageError};
use triage_orchestrator::{HandlerExecutor, HandlerResponse, RoutingDecision};

/// A mock executor that answers from a FIFO queue.
///
/// When the queue is empty, a default "mock response" text is returned.
pub struct MockExecutor {
    responses: Mutex<VecDeque<String>>,
    failing: HashSet<HandlerKind>,
    delay: Option<Duration>,
    calls: Mutex<Vec<HandlerKind>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            failing: HashSet::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock executor pre-loaded with the given replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            ..Self::new()
        }
    }

    /// Make every execution of `handler` fail.
    pub fn failing_for(mut self, handler: HandlerKind) -> Self {
        self.failing.insert(handler);
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handlers executed so far, in call order.
    pub async fn calls(&self) -> Vec<HandlerKind> {
        self.calls.lock().await.clone()
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HandlerExecutor for MockExecutor {
    async fn execute(
        &self,
        _request: &Request,
        decision: &RoutingDecision,
    ) -> Result<HandlerResponse, TriageError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().await.push(decision.handler_name);

        if self.failing.contains(&decision.handler_name) {
            return Err(TriageError::Handler {
                handler: decision.handler_name.to_string(),
                message: "mock failure".to_string(),
            });
        }
        Ok(HandlerResponse::text(self.next_response().await))
    }
}
