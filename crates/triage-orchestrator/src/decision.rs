// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The routing decision returned for every request.

use serde::Serialize;
use triage_core::{HandlerKind, RequestCategory, RoutingNote};
use triage_memory::SessionSummary;
use triage_query::{ExtractedParameters, RetrievalPlan, RetrievalStrategy};

/// Where a request goes and what the chosen handler needs to serve it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub request_id: String,
    pub category: RequestCategory,
    pub category_confidence: f64,
    pub handler_name: HandlerKind,
    pub handler_confidence: f64,
    /// Set when the handler looks data up.
    pub retrieval_strategy: Option<RetrievalStrategy>,
    pub retrieval_plan: Option<RetrievalPlan>,
    /// Set when the handler calculates.
    pub extracted_params: Option<ExtractedParameters>,
    pub session: Option<SessionSummary>,
    /// Degradations substituted while processing, in pipeline order.
    pub notes: Vec<RoutingNote>,
}

impl RoutingDecision {
    pub fn has_note(&self, note: &RoutingNote) -> bool {
        self.notes.contains(note)
    }

    /// True when no step had to fall back.
    pub fn is_clean(&self) -> bool {
        self.notes
            .iter()
            .all(|n| matches!(n, RoutingNote::SessionCreated))
    }
}
