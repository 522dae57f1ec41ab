// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler selection over a per-category routing table.
//!
//! Each category maps to an ordered list of `(handler, base_score)`
//! candidates. Selection skips disabled handlers, scales each base score by
//! the handler's performance multiplier and keeps the highest adjusted score,
//! first-listed on ties. When nothing is selectable the fallback handler is
//! returned, so selection never comes back empty-handed.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tracing::{debug, info, warn};
use triage_config::model::RouteConfig;
use triage_config::TriageConfig;
use triage_core::{HandlerKind, RequestCategory, TriageError};

use crate::performance::MultiplierSource;
use crate::registry::HandlerRegistry;

/// Confidence reported with the fallback handler when none is configured.
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.3;

/// One routing table entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub handler: HandlerKind,
    pub base_score: f64,
}

const fn c(handler: HandlerKind, base_score: f64) -> Candidate {
    Candidate {
        handler,
        base_score,
    }
}

/// Compiled-in candidates per category, in preference order.
const DEFAULT_ROUTES: &[(RequestCategory, &[Candidate])] = {
    use HandlerKind::*;
    &[
        (
            RequestCategory::ProductInquiry,
            &[c(ProductAdvisor, 0.9), c(Recommender, 0.7), c(SalesConsultant, 0.6)],
        ),
        (
            RequestCategory::CustomerService,
            &[c(CustomerService, 0.9), c(GeneralAssistant, 0.6)],
        ),
        (
            RequestCategory::OrderManagement,
            &[c(OrderManager, 0.95), c(CustomerService, 0.7)],
        ),
        (
            RequestCategory::Support,
            &[c(TechnicalSupport, 0.9), c(CustomerService, 0.7)],
        ),
        (
            RequestCategory::Sales,
            &[c(SalesConsultant, 0.9), c(FinanceCalculator, 0.75), c(ProductAdvisor, 0.6)],
        ),
        (
            RequestCategory::Recommendation,
            &[c(Recommender, 0.9), c(ProductAdvisor, 0.75)],
        ),
        (
            RequestCategory::Complaint,
            &[c(ComplaintResolver, 0.95), c(CustomerService, 0.75)],
        ),
        (
            RequestCategory::Report,
            &[c(ReportAnalyst, 0.9), c(FinanceCalculator, 0.85)],
        ),
        (RequestCategory::General, &[c(GeneralAssistant, 0.7)]),
    ]
};

/// Category -> ordered candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingTable {
    routes: BTreeMap<RequestCategory, Vec<Candidate>>,
}

impl RoutingTable {
    /// The compiled-in table with `overrides` replacing individual categories.
    ///
    /// Fails when a resulting candidate list is empty, repeats a handler, or
    /// holds a base score outside `0.0..=1.0`.
    pub fn from_routes(overrides: &[RouteConfig]) -> Result<Self, TriageError> {
        let mut table = Self::default();
        for route in overrides {
            let candidates = route
                .candidates
                .iter()
                .map(|cfg| Candidate {
                    handler: cfg.handler,
                    base_score: cfg.base_score,
                })
                .collect();
            table.routes.insert(route.category, candidates);
        }
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), TriageError> {
        for (category, candidates) in &self.routes {
            if candidates.is_empty() {
                return Err(TriageError::RoutingTable(format!(
                    "category `{category}` has no candidates"
                )));
            }
            for (i, candidate) in candidates.iter().enumerate() {
                if !(0.0..=1.0).contains(&candidate.base_score) {
                    return Err(TriageError::RoutingTable(format!(
                        "base score {} of `{}` for `{category}` is outside 0.0..=1.0",
                        candidate.base_score, candidate.handler
                    )));
                }
                if candidates[..i].iter().any(|c| c.handler == candidate.handler) {
                    return Err(TriageError::RoutingTable(format!(
                        "handler `{}` listed twice for `{category}`",
                        candidate.handler
                    )));
                }
            }
        }
        Ok(())
    }

    /// Candidates for a category, empty when the category has no route.
    pub fn candidates(&self, category: RequestCategory) -> &[Candidate] {
        self.routes.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            routes: DEFAULT_ROUTES
                .iter()
                .map(|(category, candidates)| (*category, candidates.to_vec()))
                .collect(),
        }
    }
}

/// Outcome of handler selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HandlerSelection {
    pub handler: HandlerKind,
    /// `min(1.0, base_score * multiplier)`, or the fixed fallback confidence.
    pub confidence: f64,
    pub base_score: f64,
    pub multiplier: f64,
    /// True when no candidate was selectable.
    pub fallback: bool,
}

/// Selects a handler for a category.
///
/// The registry sits behind an [`ArcSwap`] so handlers can be enabled or
/// disabled at runtime while `select` keeps running lock-free.
#[derive(Debug)]
pub struct HandlerRouter {
    table: RoutingTable,
    registry: ArcSwap<HandlerRegistry>,
    fallback_confidence: f64,
}

impl HandlerRouter {
    pub fn new(table: RoutingTable, registry: HandlerRegistry, fallback_confidence: f64) -> Self {
        Self {
            table,
            registry: ArcSwap::from_pointee(registry),
            fallback_confidence: fallback_confidence.clamp(0.0, 1.0),
        }
    }

    /// Build the table and registry from a validated configuration.
    pub fn from_config(config: &TriageConfig) -> Result<Self, TriageError> {
        let table = RoutingTable::from_routes(&config.routing.routes)?;
        let registry = HandlerRegistry::build(&table, &config.handlers);
        Ok(Self::new(table, registry, config.routing.fallback_confidence))
    }

    /// Select the handler for `category` under the given performance state.
    ///
    /// Deterministic for identical inputs; never fails.
    pub fn select(
        &self,
        category: RequestCategory,
        performance: &impl MultiplierSource,
    ) -> HandlerSelection {
        let registry = self.registry.load();
        let candidates = self.table.candidates(category);

        let mut best: Option<(Candidate, f64, f64)> = None;
        for candidate in candidates {
            if !registry.is_enabled(candidate.handler) {
                debug!(
                    category = %category,
                    handler = candidate.handler.as_str(),
                    "skipping disabled handler"
                );
                continue;
            }
            let multiplier = performance.multiplier(candidate.handler);
            let adjusted = candidate.base_score * multiplier;
            // Strict `>` keeps the first-listed candidate on ties.
            if best.is_none_or(|(_, _, top)| adjusted > top) {
                best = Some((*candidate, multiplier, adjusted));
            }
        }

        match best {
            Some((candidate, multiplier, adjusted)) => {
                debug!(
                    category = %category,
                    handler = candidate.handler.as_str(),
                    base_score = candidate.base_score,
                    multiplier,
                    "handler selected"
                );
                HandlerSelection {
                    handler: candidate.handler,
                    confidence: adjusted.clamp(0.0, 1.0),
                    base_score: candidate.base_score,
                    multiplier,
                    fallback: false,
                }
            }
            None => {
                warn!(
                    category = %category,
                    candidates = candidates.len(),
                    fallback = HandlerKind::FALLBACK.as_str(),
                    "no enabled handler for category, using fallback"
                );
                HandlerSelection {
                    handler: HandlerKind::FALLBACK,
                    confidence: self.fallback_confidence,
                    base_score: self.fallback_confidence,
                    multiplier: 1.0,
                    fallback: true,
                }
            }
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Snapshot of the registry currently used for selection.
    pub fn registry(&self) -> Arc<HandlerRegistry> {
        self.registry.load_full()
    }

    /// Enable or disable a handler for subsequent selections.
    pub fn set_enabled(&self, handler: HandlerKind, enabled: bool) {
        self.registry
            .rcu(|current| current.with_enabled(handler, enabled));
        info!(handler = handler.as_str(), enabled, "handler availability changed");
    }

    /// Publish a whole new registry.
    pub fn replace_registry(&self, registry: HandlerRegistry) {
        self.registry.store(Arc::new(registry));
    }
}

impl Default for HandlerRouter {
    fn default() -> Self {
        Self::new(
            RoutingTable::default(),
            HandlerRegistry::with_defaults(),
            DEFAULT_FALLBACK_CONFIDENCE,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use triage_config::model::CandidateConfig;

    use super::*;
    use crate::performance::PerformanceTracker;

    fn neutral() -> HashMap<HandlerKind, f64> {
        HashMap::new()
    }

    #[test]
    fn default_table_covers_every_category() {
        let table = RoutingTable::default();
        for category in RequestCategory::ALL {
            assert!(!table.candidates(category).is_empty(), "{category}");
        }
    }

    #[test]
    fn picks_highest_base_score() {
        let router = HandlerRouter::default();
        let selection = router.select(RequestCategory::OrderManagement, &neutral());
        assert_eq!(selection.handler, HandlerKind::OrderManager);
        assert!((selection.confidence - 0.95).abs() < 1e-12);
        assert!(!selection.fallback);
    }

    #[test]
    fn report_routes_to_analyst() {
        let router = HandlerRouter::default();
        let selection = router.select(RequestCategory::Report, &neutral());
        assert_eq!(selection.handler, HandlerKind::ReportAnalyst);
    }

    #[test]
    fn multiplier_can_change_the_winner() {
        let router = HandlerRouter::default();
        let perf = HashMap::from([
            (HandlerKind::ProductAdvisor, 0.5),
            (HandlerKind::Recommender, 1.2),
        ]);
        let selection = router.select(RequestCategory::ProductInquiry, &perf);
        assert_eq!(selection.handler, HandlerKind::Recommender);
        assert!((selection.confidence - 0.84).abs() < 1e-9);
        assert_eq!(selection.multiplier, 1.2);
    }

    #[test]
    fn confidence_is_capped_at_one() {
        let router = HandlerRouter::default();
        let perf = HashMap::from([(HandlerKind::ComplaintResolver, 1.2)]);
        let selection = router.select(RequestCategory::Complaint, &perf);
        assert_eq!(selection.confidence, 1.0);
        assert_eq!(selection.base_score, 0.95);
    }

    #[test]
    fn disabled_handler_is_skipped() {
        let router = HandlerRouter::default();
        router.set_enabled(HandlerKind::OrderManager, false);
        let selection = router.select(RequestCategory::OrderManagement, &neutral());
        assert_eq!(selection.handler, HandlerKind::CustomerService);
        assert!(!selection.fallback);

        router.set_enabled(HandlerKind::OrderManager, true);
        let selection = router.select(RequestCategory::OrderManagement, &neutral());
        assert_eq!(selection.handler, HandlerKind::OrderManager);
    }

    #[test]
    #[tracing_test::traced_test]
    fn all_disabled_falls_back() {
        let router = HandlerRouter::default();
        router.set_enabled(HandlerKind::ReportAnalyst, false);
        router.set_enabled(HandlerKind::FinanceCalculator, false);
        let selection = router.select(RequestCategory::Report, &neutral());
        assert_eq!(selection.handler, HandlerKind::GeneralAssistant);
        assert_eq!(selection.confidence, 0.3);
        assert!(selection.fallback);
        assert!(logs_contain("no enabled handler for category"));
    }

    #[test]
    fn ties_go_to_first_listed() {
        let table = RoutingTable::from_routes(&[RouteConfig {
            category: RequestCategory::Sales,
            candidates: vec![
                CandidateConfig {
                    handler: HandlerKind::FinanceCalculator,
                    base_score: 0.8,
                },
                CandidateConfig {
                    handler: HandlerKind::SalesConsultant,
                    base_score: 0.8,
                },
            ],
        }])
        .unwrap();
        let registry = HandlerRegistry::build(&table, &BTreeMap::new());
        let router = HandlerRouter::new(table, registry, 0.3);
        let selection = router.select(RequestCategory::Sales, &neutral());
        assert_eq!(selection.handler, HandlerKind::FinanceCalculator);
    }

    #[test]
    fn override_replaces_only_its_category() {
        let table = RoutingTable::from_routes(&[RouteConfig {
            category: RequestCategory::General,
            candidates: vec![CandidateConfig {
                handler: HandlerKind::CustomerService,
                base_score: 0.4,
            }],
        }])
        .unwrap();
        assert_eq!(table.candidates(RequestCategory::General).len(), 1);
        assert_eq!(
            table.candidates(RequestCategory::General)[0].handler,
            HandlerKind::CustomerService
        );
        assert_eq!(
            table.candidates(RequestCategory::Sales),
            RoutingTable::default().candidates(RequestCategory::Sales)
        );
    }

    #[test]
    fn malformed_override_is_rejected() {
        let empty = RoutingTable::from_routes(&[RouteConfig {
            category: RequestCategory::Sales,
            candidates: vec![],
        }]);
        assert!(matches!(empty, Err(TriageError::RoutingTable(_))));

        let out_of_range = RoutingTable::from_routes(&[RouteConfig {
            category: RequestCategory::Sales,
            candidates: vec![CandidateConfig {
                handler: HandlerKind::SalesConsultant,
                base_score: 1.5,
            }],
        }]);
        assert!(matches!(out_of_range, Err(TriageError::RoutingTable(_))));
    }

    #[test]
    fn from_config_applies_handler_overrides() {
        let config = triage_config::load_and_validate_str(
            "[handlers.complaint_resolver]\nenabled = false\n",
        )
        .unwrap();
        let router = HandlerRouter::from_config(&config).unwrap();
        let selection = router.select(RequestCategory::Complaint, &neutral());
        assert_eq!(selection.handler, HandlerKind::CustomerService);
    }

    #[test]
    fn selection_is_idempotent() {
        let router = HandlerRouter::default();
        let tracker = PerformanceTracker::new();
        tracker.observe(HandlerKind::SalesConsultant, false);
        tracker.observe(HandlerKind::FinanceCalculator, true);
        for category in RequestCategory::ALL {
            let first = router.select(category, &tracker);
            let second = router.select(category, &tracker);
            assert_eq!(first, second);
        }
    }

    fn category_strategy() -> impl Strategy<Value = RequestCategory> {
        prop::sample::select(RequestCategory::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn selection_is_bounded_and_listed(
            category in category_strategy(),
            multipliers in prop::collection::vec(0.5f64..=1.2, HandlerKind::ALL.len()),
            disabled in prop::collection::vec(any::<bool>(), HandlerKind::ALL.len()),
        ) {
            let router = HandlerRouter::default();
            for (kind, off) in HandlerKind::ALL.iter().zip(&disabled) {
                if *off {
                    router.set_enabled(*kind, false);
                }
            }
            let perf: HashMap<HandlerKind, f64> =
                HandlerKind::ALL.iter().copied().zip(multipliers).collect();

            let selection = router.select(category, &perf);
            prop_assert!((0.0..=1.0).contains(&selection.confidence));
            let listed = router
                .table()
                .candidates(category)
                .iter()
                .any(|c| c.handler == selection.handler);
            prop_assert!(listed || selection.fallback);
            if !selection.fallback {
                prop_assert!(router.registry().is_enabled(selection.handler));
            }
        }
    }
}
