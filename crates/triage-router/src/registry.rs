// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler registry: which handlers exist, what they can do, and whether the
//! router may pick them.
//!
//! The registry is immutable once built. Runtime changes (enabling or
//! disabling a handler) produce a new registry via [`HandlerRegistry::with_enabled`],
//! which the router publishes atomically.

use std::collections::BTreeMap;

use serde::Serialize;
use triage_config::model::HandlerConfig;
use triage_core::{Capability, HandlerKind, RequestCategory};

use crate::router::RoutingTable;

/// Everything the core knows about one handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerDescriptor {
    pub name: HandlerKind,
    pub display_name: String,
    pub capability_tags: Vec<Capability>,
    pub enabled: bool,
    /// Base score per category this handler is a candidate for.
    pub base_score_by_category: BTreeMap<RequestCategory, f64>,
}

impl HandlerDescriptor {
    pub fn has(&self, capability: Capability) -> bool {
        self.capability_tags.contains(&capability)
    }
}

/// Descriptor for every [`HandlerKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerRegistry {
    handlers: BTreeMap<HandlerKind, HandlerDescriptor>,
}

impl HandlerRegistry {
    /// Build the registry from the routing table and per-handler overrides.
    ///
    /// Handlers without an override are enabled under their built-in name.
    pub fn build(table: &RoutingTable, overrides: &BTreeMap<HandlerKind, HandlerConfig>) -> Self {
        let mut handlers: BTreeMap<HandlerKind, HandlerDescriptor> = HandlerKind::ALL
            .iter()
            .map(|&kind| {
                let config = overrides.get(&kind);
                let descriptor = HandlerDescriptor {
                    name: kind,
                    display_name: config
                        .and_then(|c| c.display_name.clone())
                        .unwrap_or_else(|| kind.display_name().to_string()),
                    capability_tags: kind.capabilities().to_vec(),
                    enabled: config.is_none_or(|c| c.enabled),
                    base_score_by_category: BTreeMap::new(),
                };
                (kind, descriptor)
            })
            .collect();

        for category in RequestCategory::ALL {
            for candidate in table.candidates(category) {
                if let Some(descriptor) = handlers.get_mut(&candidate.handler) {
                    descriptor
                        .base_score_by_category
                        .insert(category, candidate.base_score);
                }
            }
        }

        Self { handlers }
    }

    /// Registry over the compiled-in table with every handler enabled.
    pub fn with_defaults() -> Self {
        Self::build(&RoutingTable::default(), &BTreeMap::new())
    }

    pub fn get(&self, handler: HandlerKind) -> Option<&HandlerDescriptor> {
        self.handlers.get(&handler)
    }

    pub fn is_enabled(&self, handler: HandlerKind) -> bool {
        self.handlers.get(&handler).is_some_and(|d| d.enabled)
    }

    pub fn has_capability(&self, handler: HandlerKind, capability: Capability) -> bool {
        self.handlers.get(&handler).is_some_and(|d| d.has(capability))
    }

    /// Copy of this registry with one handler's `enabled` flag replaced.
    pub fn with_enabled(&self, handler: HandlerKind, enabled: bool) -> Self {
        let mut next = self.clone();
        if let Some(descriptor) = next.handlers.get_mut(&handler) {
            descriptor.enabled = enabled;
        }
        next
    }

    /// All descriptors, ordered by handler.
    pub fn list(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.handlers.values()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_handler() {
        let registry = HandlerRegistry::with_defaults();
        assert_eq!(registry.list().count(), HandlerKind::ALL.len());
        assert!(HandlerKind::ALL.iter().all(|&h| registry.is_enabled(h)));
    }

    #[test]
    fn overrides_disable_and_rename() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            HandlerKind::Recommender,
            HandlerConfig {
                enabled: false,
                display_name: Some("Gợi ý sản phẩm".into()),
            },
        );
        let registry = HandlerRegistry::build(&RoutingTable::default(), &overrides);
        let recommender = registry.get(HandlerKind::Recommender).unwrap();
        assert!(!recommender.enabled);
        assert_eq!(recommender.display_name, "Gợi ý sản phẩm");
    }

    #[test]
    fn base_scores_follow_the_table() {
        let registry = HandlerRegistry::with_defaults();
        let advisor = registry.get(HandlerKind::ProductAdvisor).unwrap();
        assert_eq!(
            advisor.base_score_by_category.get(&RequestCategory::ProductInquiry),
            Some(&0.9)
        );
        assert_eq!(
            advisor.base_score_by_category.get(&RequestCategory::Recommendation),
            Some(&0.75)
        );
    }

    #[test]
    fn with_enabled_leaves_original_untouched() {
        let registry = HandlerRegistry::with_defaults();
        let next = registry.with_enabled(HandlerKind::OrderManager, false);
        assert!(registry.is_enabled(HandlerKind::OrderManager));
        assert!(!next.is_enabled(HandlerKind::OrderManager));
    }

    #[test]
    fn capabilities_are_attached() {
        let registry = HandlerRegistry::with_defaults();
        assert!(registry.has_capability(HandlerKind::FinanceCalculator, Capability::Calculation));
        assert!(!registry.has_capability(HandlerKind::FinanceCalculator, Capability::DataLookup));
    }
}
