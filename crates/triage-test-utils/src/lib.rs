// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Triage integration tests.
//!
//! Provides a mock handler executor and a harness that wires a complete
//! orchestrator, for fast, deterministic tests without external backends.
//!
//! # Components
//!
//! - [`MockExecutor`] - Mock handler executor with scripted replies and failures
//! - [`TestHarness`] - Orchestrator plus executor, driven by `send()`

pub mod harness;
pub mod mock_executor;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_executor::MockExecutor;
