// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification and handler routing for Triage.
//!
//! This crate provides:
//! - [`IntentClassifier`]: Heuristic category classification (zero-cost, zero-latency)
//! - [`HandlerRouter`]: Performance-weighted handler selection with a guaranteed fallback
//! - [`HandlerRegistry`]: Handler descriptors, swappable at runtime
//! - [`PerformanceTracker`]: Lock-free per-handler success/failure multipliers

pub mod classifier;
pub mod performance;
pub mod registry;
pub mod router;

pub use classifier::{markers_for, ClassificationResult, ClassifyContext, IntentClassifier};
pub use performance::{
    HandlerPerformance, MultiplierBounds, MultiplierSource, PerformanceTracker,
};
pub use registry::{HandlerDescriptor, HandlerRegistry};
pub use router::{Candidate, HandlerRouter, HandlerSelection, RoutingTable};
