// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request orchestration for Triage.
//!
//! [`Orchestrator`] wires the classifier, router, retrieval planner,
//! parameter extractor, session memory and performance tracker into a single
//! [`process`](Orchestrator::process) call. Processing is total: every
//! request gets a concrete handler, and each step that had to fall back adds
//! a [`RoutingNote`] to the decision instead of failing.
//!
//! Handler execution stays outside the core. Callers either run handlers
//! themselves and report back through [`observe`](Orchestrator::observe), or
//! hand a [`HandlerExecutor`] to [`dispatch`](Orchestrator::dispatch).

pub mod decision;
pub mod execution;
pub mod sweeper;

pub use decision::RoutingDecision;
pub use execution::{Dispatched, HandlerExecutor, HandlerResponse};
pub use sweeper::spawn_sweeper;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use triage_config::model::HandlerConfig;
use triage_config::TriageConfig;
use triage_core::{Capability, HandlerKind, Request, RequestCategory, RoutingNote, TriageError, Turn};
use triage_memory::{AppendOutcome, ContextPatch, SessionMemory, SessionSummary};
use triage_query::RetrievalStrategySelector;
use triage_router::{
    ClassifyContext, HandlerPerformance, HandlerRegistry, HandlerRouter, IntentClassifier,
    PerformanceTracker,
};

/// The routing core, built once and shared by `Arc`.
#[derive(Debug)]
pub struct Orchestrator {
    classifier: IntentClassifier,
    router: HandlerRouter,
    strategy: RetrievalStrategySelector,
    memory: SessionMemory,
    performance: PerformanceTracker,
    sweep_interval: Duration,
    max_session_age: Duration,
}

impl Orchestrator {
    /// Build every component from a validated configuration.
    pub fn new(config: &TriageConfig) -> Result<Self, TriageError> {
        Ok(Self {
            classifier: IntentClassifier::from_config(&config.classifier),
            router: HandlerRouter::from_config(config)?,
            strategy: RetrievalStrategySelector::from_config(&config.retrieval),
            memory: SessionMemory::from_config(&config.session),
            performance: PerformanceTracker::from_config(&config.performance),
            sweep_interval: Duration::from_secs(config.session.sweep_interval_secs),
            max_session_age: Duration::from_secs(config.session.max_age_secs),
        })
    }

    /// Route a request. Never fails.
    pub fn process(&self, request: &Request) -> RoutingDecision {
        let mut notes = Vec::new();
        let session_id = self.usable_session_id(request, &mut notes);

        // 1. Classify, with the previous intent as conversation context. An
        // explicit hint from the caller wins over session memory.
        let last_intent = request.intent_hint().or_else(|| {
            session_id.and_then(|id| match self.memory.get_context(id) {
                Ok(context) => context.and_then(|c| c.last_intent),
                Err(e) => {
                    debug!(error = %e, "session context unavailable");
                    None
                }
            })
        });
        let classification = self
            .classifier
            .classify(&request.text, &ClassifyContext { last_intent });
        if classification.ambiguous {
            notes.push(RoutingNote::ClassificationAmbiguous);
        }
        debug!(
            request_id = request.id.as_str(),
            category = %classification.category,
            confidence = classification.confidence,
            reason = classification.reason,
            "request classified"
        );

        // 2. Select a handler.
        let selection = self.router.select(classification.category, &self.performance);
        if selection.fallback {
            notes.push(RoutingNote::NoEnabledHandler {
                category: classification.category,
            });
        }
        let registry = self.router.registry();

        // 3. Plan retrieval for data lookups.
        let retrieval_plan = registry
            .has_capability(selection.handler, Capability::DataLookup)
            .then(|| self.strategy.plan(&request.text));

        // 4. Extract numbers for calculations.
        let extracted_params = registry
            .has_capability(selection.handler, Capability::Calculation)
            .then(|| triage_query::extract(&request.text));
        if extracted_params.as_ref().is_some_and(|p| !p.resolved) {
            notes.push(RoutingNote::ParameterUnresolved);
        }

        // 5-6. Record the user turn and refresh the session context.
        let session = session_id.and_then(|id| {
            let codes = retrieval_plan
                .as_ref()
                .map(|plan| plan.codes.clone())
                .unwrap_or_default();
            self.record_user_turn(id, request, classification.category, codes, &mut notes)
        });

        let decision = RoutingDecision {
            request_id: request.id.clone(),
            category: classification.category,
            category_confidence: classification.confidence,
            handler_name: selection.handler,
            handler_confidence: selection.confidence,
            retrieval_strategy: retrieval_plan.as_ref().map(|plan| plan.strategy),
            retrieval_plan,
            extracted_params,
            session,
            notes,
        };
        debug!(
            request_id = decision.request_id.as_str(),
            handler = decision.handler_name.as_str(),
            confidence = decision.handler_confidence,
            notes = decision.notes.len(),
            "request routed"
        );
        decision
    }

    fn usable_session_id<'r>(
        &self,
        request: &'r Request,
        notes: &mut Vec<RoutingNote>,
    ) -> Option<&'r str> {
        let id = request.session_id.as_deref()?;
        if id.trim().is_empty() {
            warn!(request_id = request.id.as_str(), "empty session id, skipping session memory");
            notes.push(RoutingNote::SessionSkipped {
                reason: TriageError::InvalidSessionId.to_string(),
            });
            return None;
        }
        Some(id)
    }

    fn record_user_turn(
        &self,
        session_id: &str,
        request: &Request,
        category: RequestCategory,
        codes: Vec<String>,
        notes: &mut Vec<RoutingNote>,
    ) -> Option<SessionSummary> {
        let turn = Turn::user(request.text.as_str())
            .with_metadata("request_id", json!(request.id))
            .with_metadata("category", json!(category));

        let mut patch = ContextPatch::new();
        // The fallback category carries no intent worth remembering.
        if category != RequestCategory::FALLBACK {
            patch = patch.intent(category);
        }
        if !codes.is_empty() {
            patch = patch.entities(codes);
        }

        match self.memory.append_with_context(session_id, turn, patch) {
            Ok((outcome, summary)) => {
                if outcome.created {
                    notes.push(RoutingNote::SessionCreated);
                }
                Some(summary)
            }
            Err(e) => {
                warn!(session_id, error = %e, "session memory skipped");
                notes.push(RoutingNote::SessionSkipped {
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Report the outcome of a handler execution; returns the new multiplier.
    pub fn observe(&self, handler: HandlerKind, success: bool) -> f64 {
        self.performance.observe(handler, success)
    }

    /// [`observe`](Self::observe) for feedback that names the handler as text.
    pub fn observe_named(&self, handler: &str, success: bool) -> Result<f64, TriageError> {
        Ok(self.observe(HandlerKind::from_name(handler)?, success))
    }

    /// Append the handler's reply to the session history.
    pub fn record_response(
        &self,
        session_id: &str,
        content: impl Into<String>,
    ) -> Result<AppendOutcome, TriageError> {
        self.memory.append(session_id, Turn::assistant(content))
    }

    /// Enable or disable a handler for subsequent requests.
    pub fn set_handler_enabled(&self, handler: HandlerKind, enabled: bool) {
        self.router.set_enabled(handler, enabled);
    }

    /// Rebuild the handler registry from fresh `[handlers.*]` overrides,
    /// keeping the routing table.
    pub fn reload_handlers(&self, overrides: &BTreeMap<HandlerKind, HandlerConfig>) {
        let registry = HandlerRegistry::build(self.router.table(), overrides);
        self.router.replace_registry(registry);
        info!(overrides = overrides.len(), "handler registry reloaded");
    }

    pub fn performance_snapshot(&self) -> Vec<HandlerPerformance> {
        self.performance.snapshot()
    }

    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    pub fn router(&self) -> &HandlerRouter {
        &self.router
    }

    pub fn performance(&self) -> &PerformanceTracker {
        &self.performance
    }

    /// Start the background session sweep with the configured interval and age.
    pub fn start_sweeper(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        spawn_sweeper(
            Arc::clone(self),
            self.sweep_interval,
            self.max_session_age,
            cancel,
        )
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self {
            classifier: IntentClassifier::default(),
            router: HandlerRouter::default(),
            strategy: RetrievalStrategySelector::default(),
            memory: SessionMemory::default(),
            performance: PerformanceTracker::default(),
            sweep_interval: Duration::from_secs(60),
            max_session_age: Duration::from_secs(30 * 60),
        }
    }
}
