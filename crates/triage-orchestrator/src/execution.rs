// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler execution seam.
//!
//! The core never runs handlers itself. [`Orchestrator::dispatch`] routes a
//! request, awaits an external [`HandlerExecutor`], and only once the
//! executor has finished records the outcome in the performance tracker and
//! the assistant turn in session memory. A dispatch future that is dropped
//! mid-execution therefore leaves performance state untouched.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};
use triage_core::{Request, TriageError};

use crate::decision::RoutingDecision;
use crate::Orchestrator;

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub content: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl HandlerResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }
}

/// Runs the handler named by a routing decision.
///
/// Implementations talk to the generative and retrieval backends; none of
/// that is the core's concern.
#[async_trait]
pub trait HandlerExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &Request,
        decision: &RoutingDecision,
    ) -> Result<HandlerResponse, TriageError>;
}

/// A routed and executed request.
#[derive(Debug)]
pub struct Dispatched {
    pub decision: RoutingDecision,
    pub outcome: Result<HandlerResponse, TriageError>,
    /// Multiplier of the executing handler after this outcome.
    pub multiplier: f64,
}

impl Orchestrator {
    /// Route `request`, run it through `executor`, and feed the outcome back.
    pub async fn dispatch<E>(&self, request: &Request, executor: &E) -> Dispatched
    where
        E: HandlerExecutor + ?Sized,
    {
        let decision = self.process(request);
        let outcome = executor.execute(request, &decision).await;

        let multiplier = self.observe(decision.handler_name, outcome.is_ok());
        match &outcome {
            Ok(response) => {
                debug!(
                    request_id = decision.request_id.as_str(),
                    handler = decision.handler_name.as_str(),
                    multiplier,
                    "handler succeeded"
                );
                if let Some(session_id) = decision.session.as_ref().map(|s| s.session_id.as_str())
                    && let Err(e) = self.record_response(session_id, response.content.as_str())
                {
                    warn!(session_id, error = %e, "failed to record handler response");
                }
            }
            Err(e) => {
                warn!(
                    request_id = decision.request_id.as_str(),
                    handler = decision.handler_name.as_str(),
                    multiplier,
                    error = %e,
                    "handler failed"
                );
            }
        }

        Dispatched {
            decision,
            outcome,
            multiplier,
        }
    }
}
