// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the classifier, router, session memory and orchestrator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::TriageError;

/// Closed set of request intents.
///
/// Declaration order is significant: the classifier breaks score ties in
/// favour of the variant declared first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    ProductInquiry,
    CustomerService,
    OrderManagement,
    Support,
    Sales,
    Recommendation,
    Complaint,
    Report,
    General,
}

impl RequestCategory {
    /// All categories in declaration order.
    pub const ALL: [RequestCategory; 9] = [
        RequestCategory::ProductInquiry,
        RequestCategory::CustomerService,
        RequestCategory::OrderManagement,
        RequestCategory::Support,
        RequestCategory::Sales,
        RequestCategory::Recommendation,
        RequestCategory::Complaint,
        RequestCategory::Report,
        RequestCategory::General,
    ];

    /// Category used when classification is not confident enough.
    pub const FALLBACK: RequestCategory = RequestCategory::General;
}

/// What a handler needs from the routing core before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Reads from the structured catalog or the vector index.
    DataLookup,
    /// Runs a deterministic calculation over extracted numbers.
    Calculation,
    /// Free-form conversational answer.
    Conversation,
    /// May hand the case over to a human.
    Escalation,
}

/// Closed set of handlers the router can select.
///
/// Handler names in configuration are parsed into this enum, so an unknown
/// name is rejected when the configuration is loaded.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    ProductAdvisor,
    CustomerService,
    OrderManager,
    TechnicalSupport,
    SalesConsultant,
    Recommender,
    ComplaintResolver,
    ReportAnalyst,
    FinanceCalculator,
    GeneralAssistant,
}

impl HandlerKind {
    /// All handlers in declaration order.
    pub const ALL: [HandlerKind; 10] = [
        HandlerKind::ProductAdvisor,
        HandlerKind::CustomerService,
        HandlerKind::OrderManager,
        HandlerKind::TechnicalSupport,
        HandlerKind::SalesConsultant,
        HandlerKind::Recommender,
        HandlerKind::ComplaintResolver,
        HandlerKind::ReportAnalyst,
        HandlerKind::FinanceCalculator,
        HandlerKind::GeneralAssistant,
    ];

    /// Handler returned when nothing else is routable.
    pub const FALLBACK: HandlerKind = HandlerKind::GeneralAssistant;

    /// Stable snake_case name, as used in configuration and logs.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Look a handler up by its snake_case name.
    pub fn from_name(name: &str) -> Result<Self, TriageError> {
        name.parse().map_err(|_| TriageError::UnknownHandler {
            name: name.to_string(),
        })
    }

    /// Default human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            HandlerKind::ProductAdvisor => "Product Advisor",
            HandlerKind::CustomerService => "Customer Service",
            HandlerKind::OrderManager => "Order Manager",
            HandlerKind::TechnicalSupport => "Technical Support",
            HandlerKind::SalesConsultant => "Sales Consultant",
            HandlerKind::Recommender => "Recommender",
            HandlerKind::ComplaintResolver => "Complaint Resolver",
            HandlerKind::ReportAnalyst => "Report Analyst",
            HandlerKind::FinanceCalculator => "Finance Calculator",
            HandlerKind::GeneralAssistant => "General Assistant",
        }
    }

    /// Capability tags that decide which pre-processing steps run.
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            HandlerKind::ProductAdvisor => &[DataLookup, Conversation],
            HandlerKind::CustomerService => &[Conversation],
            HandlerKind::OrderManager => &[DataLookup],
            HandlerKind::TechnicalSupport => &[DataLookup, Conversation],
            HandlerKind::SalesConsultant => &[DataLookup, Calculation],
            HandlerKind::Recommender => &[DataLookup],
            HandlerKind::ComplaintResolver => &[Conversation, Escalation],
            HandlerKind::ReportAnalyst => &[DataLookup, Calculation],
            HandlerKind::FinanceCalculator => &[Calculation],
            HandlerKind::GeneralAssistant => &[Conversation],
        }
    }

    /// Whether this handler carries the given capability.
    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Scheduling hint supplied by the caller.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// A transient inbound request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    /// Caller metadata passed through to handlers. The core reads only
    /// [`INTENT_HINT_KEY`].
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

/// Context key carrying the intent of the caller's previous turn, for callers
/// that keep conversation state themselves.
pub const INTENT_HINT_KEY: &str = "intent";

impl Request {
    /// Create a request with a fresh id and the current timestamp.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            user_id: None,
            session_id: None,
            timestamp: Utc::now(),
            priority: Priority::default(),
            context: HashMap::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// The caller-supplied previous intent, if it names a known category.
    pub fn intent_hint(&self) -> Option<RequestCategory> {
        self.context
            .get(INTENT_HINT_KEY)?
            .as_str()?
            .parse()
            .ok()
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One entry in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A degradation recorded while processing a request.
///
/// None of these abort processing; each one names the fallback that was
/// substituted so callers and logs can see why confidence dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingNote {
    /// Classification fell below the activation threshold; fallback category used.
    ClassificationAmbiguous,
    /// Every candidate for the category was disabled; fallback handler used.
    NoEnabledHandler { category: RequestCategory },
    /// No trustworthy amount was found in the text.
    ParameterUnresolved,
    /// The session id was unseen (or evicted) and a new session was started.
    SessionCreated,
    /// Session memory was bypassed for this request.
    SessionSkipped { reason: String },
}
