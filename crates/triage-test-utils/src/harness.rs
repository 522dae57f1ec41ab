// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles an orchestrator from inline TOML plus a
//! [`MockExecutor`], and provides `send()` to drive the full
//! route-execute-observe cycle in tests.

use std::sync::Arc;

use triage_config::{load_and_validate_str, TriageConfig};
use triage_core::{HandlerKind, Request, TriageError};
use triage_orchestrator::{Dispatched, Orchestrator, RoutingDecision};

use crate::mock_executor::MockExecutor;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config_toml: String,
    disabled: Vec<HandlerKind>,
    executor: MockExecutor,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config_toml: String::new(),
            disabled: Vec::new(),
            executor: MockExecutor::new(),
        }
    }

    /// Use this TOML instead of the compiled-in defaults.
    pub fn with_config(mut self, toml: &str) -> Self {
        self.config_toml = toml.to_string();
        self
    }

    /// Disable a handler after the orchestrator is built.
    pub fn with_disabled(mut self, handler: HandlerKind) -> Self {
        self.disabled.push(handler);
        self
    }

    pub fn with_executor(mut self, executor: MockExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn build(self) -> Result<TestHarness, TriageError> {
        let config: TriageConfig = load_and_validate_str(&self.config_toml).map_err(|errors| {
            TriageError::Config(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        let orchestrator = Arc::new(Orchestrator::new(&config)?);
        for handler in self.disabled {
            orchestrator.set_handler_enabled(handler, false);
        }
        Ok(TestHarness {
            orchestrator,
            executor: Arc::new(self.executor),
        })
    }
}

/// A fully wired orchestrator plus the mock executor behind it.
pub struct TestHarness {
    pub orchestrator: Arc<Orchestrator>,
    pub executor: Arc<MockExecutor>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness over the default configuration.
    pub fn new() -> Result<Self, TriageError> {
        Self::builder().build()
    }

    /// Route without executing.
    pub fn route(&self, session_id: &str, text: &str) -> RoutingDecision {
        self.orchestrator
            .process(&Request::new(text).with_session(session_id))
    }

    /// Route, execute with the mock executor, and feed the outcome back.
    pub async fn send(&self, session_id: &str, text: &str) -> Dispatched {
        let request = Request::new(text).with_session(session_id);
        self.orchestrator
            .dispatch(&request, self.executor.as_ref())
            .await
    }
}
