// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Triage routing core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages. Handler names
//! and categories deserialize into closed enums, so a typo in either fails
//! the load instead of surfacing on the first request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use triage_core::{HandlerKind, RequestCategory};

/// Top-level Triage configuration.
///
/// All sections are optional and default to the compiled-in values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    /// Intent classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Handler selection settings and routing table overrides.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Per-handler registry overrides, keyed by handler name.
    #[serde(default)]
    pub handlers: BTreeMap<HandlerKind, HandlerConfig>,

    /// Adaptive performance multiplier settings.
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Session memory settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Retrieval strategy settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Intent classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Minimum hit ratio a category needs to win (0.0-1.0).
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f64,

    /// Confidence reported with the fallback category.
    #[serde(default = "default_classifier_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Longest message (in tokens) treated as a follow-up of the previous intent.
    #[serde(default = "default_follow_up_max_tokens")]
    pub follow_up_max_tokens: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            activation_threshold: default_activation_threshold(),
            fallback_confidence: default_classifier_fallback_confidence(),
            follow_up_max_tokens: default_follow_up_max_tokens(),
        }
    }
}

fn default_activation_threshold() -> f64 {
    0.1
}

fn default_classifier_fallback_confidence() -> f64 {
    0.5
}

fn default_follow_up_max_tokens() -> usize {
    4
}

/// Handler selection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Confidence reported when the fallback handler is selected.
    #[serde(default = "default_routing_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Replacement candidate lists for individual categories.
    /// Categories not listed keep the compiled-in table.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fallback_confidence: default_routing_fallback_confidence(),
            routes: Vec::new(),
        }
    }
}

fn default_routing_fallback_confidence() -> f64 {
    0.3
}

/// Ordered candidate list for one category.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub category: RequestCategory,
    pub candidates: Vec<CandidateConfig>,
}

/// One `(handler, base_score)` entry of a route.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CandidateConfig {
    pub handler: HandlerKind,
    pub base_score: f64,
}

/// Registry override for a single handler.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
    /// Disabled handlers are skipped by the router.
    #[serde(default = "default_handler_enabled")]
    pub enabled: bool,

    /// Overrides the built-in display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            enabled: default_handler_enabled(),
            display_name: None,
        }
    }
}

fn default_handler_enabled() -> bool {
    true
}

/// Lowest accepted `performance.floor`.
pub const MIN_MULTIPLIER_FLOOR: f64 = 0.5;

/// Highest accepted `performance.ceiling`.
pub const MAX_MULTIPLIER_CEILING: f64 = 1.2;

/// Longest accepted `session.sweep_interval_secs` (one day).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Adaptive performance multiplier configuration.
///
/// The multiplier drifts slowly within `[floor, ceiling]`: a failing handler
/// stays selectable and a succeeding one cannot dominate without bound.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PerformanceConfig {
    #[serde(default = "default_multiplier_floor")]
    pub floor: f64,

    #[serde(default = "default_multiplier_ceiling")]
    pub ceiling: f64,

    /// Factor applied on each successful execution (>= 1.0).
    #[serde(default = "default_success_factor")]
    pub success_factor: f64,

    /// Factor applied on each failed execution (<= 1.0).
    #[serde(default = "default_failure_factor")]
    pub failure_factor: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            floor: default_multiplier_floor(),
            ceiling: default_multiplier_ceiling(),
            success_factor: default_success_factor(),
            failure_factor: default_failure_factor(),
        }
    }
}

fn default_multiplier_floor() -> f64 {
    0.5
}

fn default_multiplier_ceiling() -> f64 {
    1.2
}

fn default_success_factor() -> f64 {
    1.01
}

fn default_failure_factor() -> f64 {
    0.99
}

/// Session memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Ring buffer capacity per session.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Inactivity after which a sweep evicts a session.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    /// Interval between background sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Soft cap on live sessions; the stalest is evicted to make room.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            max_age_secs: default_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_history_capacity() -> usize {
    20
}

fn default_max_age_secs() -> u64 {
    1800 // 30 minutes
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_max_sessions() -> usize {
    10_000
}

/// Retrieval strategy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Longest query (in tokens, price range excluded) still sent to the
    /// structured backend.
    #[serde(default = "default_max_structured_tokens")]
    pub max_structured_tokens: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_structured_tokens: default_max_structured_tokens(),
        }
    }
}

fn default_max_structured_tokens() -> usize {
    4
}
