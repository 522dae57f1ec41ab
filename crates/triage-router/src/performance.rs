// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adaptive per-handler performance multipliers.
//!
//! Each handler carries a multiplier that starts at 1.0 on its first
//! observation and drifts by a fixed factor per reported outcome, clamped to
//! `[floor, ceiling]`. The multiplier is stored as `f64` bits in an
//! `AtomicU64` and updated with a compare-and-swap loop, so concurrent
//! success and failure reports never lose an update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;
use triage_config::model::{PerformanceConfig, MAX_MULTIPLIER_CEILING, MIN_MULTIPLIER_FLOOR};
use triage_core::HandlerKind;

/// Initial multiplier for a handler with no observations.
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// Read access to the multiplier applied to a handler's base score.
pub trait MultiplierSource {
    fn multiplier(&self, handler: HandlerKind) -> f64;
}

/// Fixed multipliers, mostly for tests and replays.
impl MultiplierSource for HashMap<HandlerKind, f64> {
    fn multiplier(&self, handler: HandlerKind) -> f64 {
        self.get(&handler).copied().unwrap_or(DEFAULT_MULTIPLIER)
    }
}

/// Bounds and step factors of the multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiplierBounds {
    pub floor: f64,
    pub ceiling: f64,
    pub success_factor: f64,
    pub failure_factor: f64,
}

impl MultiplierBounds {
    pub fn from_config(config: &PerformanceConfig) -> Self {
        Self {
            floor: config.floor,
            ceiling: config.ceiling,
            success_factor: config.success_factor,
            failure_factor: config.failure_factor,
        }
    }

    /// The multiplier after one more observation.
    ///
    /// The result never leaves the hard limits `[0.5, 1.2]`, even for bounds
    /// built by hand with non-finite values.
    pub fn step(&self, current: f64, success: bool) -> f64 {
        let factor = if success {
            self.success_factor
        } else {
            self.failure_factor
        };
        // f64::max/min return the non-NaN operand.
        let floor = self.floor.max(MIN_MULTIPLIER_FLOOR);
        let ceiling = self.ceiling.min(MAX_MULTIPLIER_CEILING);
        (current * factor).max(floor).min(ceiling)
    }
}

impl Default for MultiplierBounds {
    fn default() -> Self {
        Self::from_config(&PerformanceConfig::default())
    }
}

#[derive(Debug)]
struct HandlerStats {
    multiplier_bits: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl HandlerStats {
    fn new() -> Self {
        Self {
            multiplier_bits: AtomicU64::new(DEFAULT_MULTIPLIER.to_bits()),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    fn multiplier(&self) -> f64 {
        f64::from_bits(self.multiplier_bits.load(Ordering::Acquire))
    }
}

/// Point-in-time view of one handler's performance state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerPerformance {
    pub handler: HandlerKind,
    pub multiplier: f64,
    pub successes: u64,
    pub failures: u64,
}

/// Process-lifetime performance state shared by every request.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    stats: DashMap<HandlerKind, HandlerStats>,
    bounds: MultiplierBounds,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(bounds: MultiplierBounds) -> Self {
        Self {
            stats: DashMap::new(),
            bounds,
        }
    }

    pub fn from_config(config: &PerformanceConfig) -> Self {
        Self::with_bounds(MultiplierBounds::from_config(config))
    }

    pub fn bounds(&self) -> MultiplierBounds {
        self.bounds
    }

    /// Record the outcome of one handler execution and return the new multiplier.
    pub fn observe(&self, handler: HandlerKind, success: bool) -> f64 {
        if let Some(stats) = self.stats.get(&handler) {
            return self.apply(handler, &stats, success);
        }
        let stats = self
            .stats
            .entry(handler)
            .or_insert_with(HandlerStats::new)
            .downgrade();
        self.apply(handler, &stats, success)
    }

    fn apply(&self, handler: HandlerKind, stats: &HandlerStats, success: bool) -> f64 {
        let counter = if success {
            &stats.successes
        } else {
            &stats.failures
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let bounds = self.bounds;
        let previous = stats
            .multiplier_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some(bounds.step(f64::from_bits(bits), success).to_bits())
            })
            // The closure never returns None.
            .unwrap_or_else(|bits| bits);
        let updated = bounds.step(f64::from_bits(previous), success);

        debug!(
            handler = handler.as_str(),
            success,
            multiplier = updated,
            "handler performance observed"
        );
        updated
    }

    /// Current multiplier, 1.0 for handlers never observed.
    pub fn get_multiplier(&self, handler: HandlerKind) -> f64 {
        self.stats
            .get(&handler)
            .map(|s| s.multiplier())
            .unwrap_or(DEFAULT_MULTIPLIER)
    }

    /// Performance state of every observed handler, ordered by handler.
    pub fn snapshot(&self) -> Vec<HandlerPerformance> {
        let mut out: Vec<HandlerPerformance> = self
            .stats
            .iter()
            .map(|entry| HandlerPerformance {
                handler: *entry.key(),
                multiplier: entry.value().multiplier(),
                successes: entry.value().successes.load(Ordering::Relaxed),
                failures: entry.value().failures.load(Ordering::Relaxed),
            })
            .collect();
        out.sort_by_key(|p| p.handler);
        out
    }
}

impl MultiplierSource for PerformanceTracker {
    fn multiplier(&self, handler: HandlerKind) -> f64 {
        self.get_multiplier(handler)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const H: HandlerKind = HandlerKind::ProductAdvisor;

    #[test]
    fn unobserved_handler_defaults_to_one() {
        let tracker = PerformanceTracker::new();
        assert_eq!(tracker.get_multiplier(H), 1.0);
        assert!(tracker.snapshot().is_empty());
    }

    #[test]
    fn success_and_failure_step_by_one_percent() {
        let tracker = PerformanceTracker::new();
        assert!((tracker.observe(H, true) - 1.01).abs() < 1e-12);
        assert!((tracker.observe(H, false) - 1.01 * 0.99).abs() < 1e-12);
    }

    #[test]
    fn multiplier_saturates_at_ceiling() {
        let tracker = PerformanceTracker::new();
        for _ in 0..100 {
            tracker.observe(H, true);
        }
        assert_eq!(tracker.get_multiplier(H), 1.2);
    }

    #[test]
    fn multiplier_saturates_at_floor() {
        let tracker = PerformanceTracker::new();
        for _ in 0..500 {
            tracker.observe(H, false);
        }
        assert_eq!(tracker.get_multiplier(H), 0.5);
    }

    #[test]
    fn hand_built_bounds_cannot_escape_hard_limits() {
        for ceiling in [f64::NAN, f64::INFINITY, 5.0] {
            let tracker = PerformanceTracker::with_bounds(MultiplierBounds {
                ceiling,
                floor: f64::NAN,
                ..MultiplierBounds::default()
            });
            for _ in 0..500 {
                tracker.observe(H, true);
            }
            assert_eq!(tracker.get_multiplier(H), 1.2, "{ceiling}");
            for _ in 0..1_000 {
                tracker.observe(H, false);
            }
            assert_eq!(tracker.get_multiplier(H), 0.5, "{ceiling}");
        }
    }

    #[test]
    fn handlers_are_independent() {
        let tracker = PerformanceTracker::new();
        tracker.observe(H, false);
        assert_eq!(tracker.get_multiplier(HandlerKind::Recommender), 1.0);
    }

    #[test]
    fn snapshot_reports_counts() {
        let tracker = PerformanceTracker::new();
        tracker.observe(HandlerKind::Recommender, true);
        tracker.observe(H, true);
        tracker.observe(H, false);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].handler, H);
        assert_eq!(snapshot[0].successes, 1);
        assert_eq!(snapshot[0].failures, 1);
        assert_eq!(snapshot[1].handler, HandlerKind::Recommender);
    }

    #[test]
    fn concurrent_successes_are_never_lost() {
        let tracker = Arc::new(PerformanceTracker::new());
        std::thread::scope(|scope| {
            for _ in 0..8 {
                let tracker = Arc::clone(&tracker);
                scope.spawn(move || {
                    tracker.observe(H, true);
                    tracker.observe(H, true);
                });
            }
        });

        let bounds = MultiplierBounds::default();
        let expected = (0..16).fold(1.0, |m, _| bounds.step(m, true));
        assert!((tracker.get_multiplier(H) - expected).abs() < 1e-12);
        assert_eq!(tracker.snapshot()[0].successes, 16);
    }

    #[test]
    fn concurrent_mixed_reports_stay_in_bounds() {
        let tracker = Arc::new(PerformanceTracker::new());
        std::thread::scope(|scope| {
            for worker in 0..16 {
                let tracker = Arc::clone(&tracker);
                scope.spawn(move || {
                    for i in 0..2_000 {
                        let m = tracker.observe(H, (worker + i) % 3 != 0);
                        assert!((0.5..=1.2).contains(&m));
                    }
                });
            }
        });

        let snap = &tracker.snapshot()[0];
        assert_eq!(snap.successes + snap.failures, 32_000);
        assert!((0.5..=1.2).contains(&snap.multiplier));
    }
}
