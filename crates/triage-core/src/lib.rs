// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Triage request routing workspace.
//!
//! This crate provides the error type and the common types (requests,
//! categories, handlers, turns, routing notes) used by every other crate,
//! plus the text normalization the matchers share.

pub mod error;
pub mod text;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TriageError;
pub use types::{
    Capability, HandlerKind, Priority, Request, RequestCategory, Role, RoutingNote, Turn,
    INTENT_HINT_KEY,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn category_display_and_parse_round_trip() {
        for category in RequestCategory::ALL {
            let s = category.to_string();
            let parsed = RequestCategory::from_str(&s).expect("should parse back");
            assert_eq!(category, parsed);
        }
        assert_eq!(RequestCategory::OrderManagement.to_string(), "order_management");
    }

    #[test]
    fn handler_names_are_snake_case() {
        assert_eq!(HandlerKind::FinanceCalculator.as_str(), "finance_calculator");
        assert_eq!(
            HandlerKind::from_str("general_assistant").unwrap(),
            HandlerKind::GeneralAssistant
        );
        assert!(HandlerKind::from_str("billing_bot").is_err());
    }

    #[test]
    fn every_handler_has_capabilities() {
        for handler in HandlerKind::ALL {
            assert!(!handler.capabilities().is_empty(), "{handler} has none");
            assert!(!handler.display_name().is_empty());
        }
        assert!(HandlerKind::FinanceCalculator.has(Capability::Calculation));
        assert!(!HandlerKind::FinanceCalculator.has(Capability::DataLookup));
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&RequestCategory::ProductInquiry).unwrap();
        assert_eq!(json, "\"product_inquiry\"");
        let parsed: RequestCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, RequestCategory::ProductInquiry);
    }

    #[test]
    fn request_builder_sets_fields() {
        let req = Request::new("xin chào")
            .with_session("s-1")
            .with_user("u-1")
            .with_priority(Priority::High)
            .with_context("channel", serde_json::json!("web"));
        assert_eq!(req.session_id.as_deref(), Some("s-1"));
        assert_eq!(req.user_id.as_deref(), Some("u-1"));
        assert_eq!(req.priority, Priority::High);
        assert_eq!(req.context["channel"], "web");
        assert!(!req.id.is_empty());
    }

    #[test]
    fn routing_note_is_tagged() {
        let note = RoutingNote::NoEnabledHandler {
            category: RequestCategory::Sales,
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["kind"], "no_enabled_handler");
        assert_eq!(json["category"], "sales");
    }

    #[test]
    fn handler_names_resolve() {
        assert_eq!(
            HandlerKind::from_name("order_manager").unwrap(),
            HandlerKind::OrderManager
        );
        let err = HandlerKind::from_name("billing_bot").unwrap_err();
        assert!(matches!(err, TriageError::UnknownHandler { ref name } if name == "billing_bot"));
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = HandlerKind::from_name("billing_bot").unwrap_err();
        assert_eq!(err.to_string(), "unknown handler `billing_bot`");
        assert_eq!(
            TriageError::InvalidSessionId.to_string(),
            "session id must not be empty"
        );
    }
}
