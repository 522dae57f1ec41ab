// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! score and confidence ranges, multiplier bounds, and routing table shape.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{
    TriageConfig, MAX_MULTIPLIER_CEILING, MAX_SWEEP_INTERVAL_SECS, MIN_MULTIPLIER_FLOOR,
};

fn unit_range(errors: &mut Vec<ConfigError>, key: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::Validation {
            message: format!("{key} must be within 0.0..=1.0, got {value}"),
        });
    }
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TriageConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    unit_range(
        &mut errors,
        "classifier.activation_threshold",
        config.classifier.activation_threshold,
    );
    unit_range(
        &mut errors,
        "classifier.fallback_confidence",
        config.classifier.fallback_confidence,
    );
    unit_range(
        &mut errors,
        "routing.fallback_confidence",
        config.routing.fallback_confidence,
    );

    // Routing table overrides
    let mut seen_categories = HashSet::new();
    for (i, route) in config.routing.routes.iter().enumerate() {
        if !seen_categories.insert(route.category) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "duplicate route for category `{}` in [[routing.routes]]",
                    route.category
                ),
            });
        }
        if route.candidates.is_empty() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "routing.routes[{i}] (`{}`) must list at least one candidate",
                    route.category
                ),
            });
        }
        let mut seen_handlers = HashSet::new();
        for candidate in &route.candidates {
            if !seen_handlers.insert(candidate.handler) {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "handler `{}` listed twice for category `{}`",
                        candidate.handler, route.category
                    ),
                });
            }
            unit_range(
                &mut errors,
                &format!("routing.routes[{i}].{}.base_score", candidate.handler),
                candidate.base_score,
            );
        }
    }

    // Multiplier bounds bracket the initial value 1.0 and stay within the
    // hard limits; NaN fails every range check below.
    let perf = &config.performance;
    if !(MIN_MULTIPLIER_FLOOR..=1.0).contains(&perf.floor) {
        errors.push(ConfigError::Validation {
            message: format!(
                "performance.floor must be within {MIN_MULTIPLIER_FLOOR}..=1.0, got {}",
                perf.floor
            ),
        });
    }
    if !(1.0..=MAX_MULTIPLIER_CEILING).contains(&perf.ceiling) {
        errors.push(ConfigError::Validation {
            message: format!(
                "performance.ceiling must be within 1.0..={MAX_MULTIPLIER_CEILING}, got {}",
                perf.ceiling
            ),
        });
    }
    if !(perf.success_factor.is_finite() && perf.success_factor >= 1.0) {
        errors.push(ConfigError::Validation {
            message: format!(
                "performance.success_factor must be a finite value of at least 1.0, got {}",
                perf.success_factor
            ),
        });
    }
    if !(perf.failure_factor > 0.0 && perf.failure_factor <= 1.0) {
        errors.push(ConfigError::Validation {
            message: format!(
                "performance.failure_factor must be within (0.0, 1.0], got {}",
                perf.failure_factor
            ),
        });
    }

    let session = &config.session;
    if session.history_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "session.history_capacity must be at least 1".to_string(),
        });
    }
    if session.max_age_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.max_age_secs must be at least 1".to_string(),
        });
    }
    if !(1..=MAX_SWEEP_INTERVAL_SECS).contains(&session.sweep_interval_secs) {
        errors.push(ConfigError::Validation {
            message: format!(
                "session.sweep_interval_secs must be within 1..={MAX_SWEEP_INTERVAL_SECS}, got {}",
                session.sweep_interval_secs
            ),
        });
    }
    if session.max_sessions == 0 {
        errors.push(ConfigError::Validation {
            message: "session.max_sessions must be at least 1".to_string(),
        });
    }

    if config.retrieval.max_structured_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.max_structured_tokens must be at least 1".to_string(),
        });
    }

    for (handler, handler_config) in &config.handlers {
        if let Some(name) = &handler_config.display_name
            && name.trim().is_empty()
        {
            errors.push(ConfigError::Validation {
                message: format!("handlers.{handler}.display_name must not be empty"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use triage_core::{HandlerKind, RequestCategory};

    use super::*;
    use crate::model::{CandidateConfig, HandlerConfig, RouteConfig};

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = TriageConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let mut config = TriageConfig::default();
        config.classifier.activation_threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "activation_threshold"));
    }

    #[test]
    fn empty_route_fails() {
        let mut config = TriageConfig::default();
        config.routing.routes.push(RouteConfig {
            category: RequestCategory::Sales,
            candidates: vec![],
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "at least one candidate"));
    }

    #[test]
    fn duplicate_route_and_handler_fail() {
        let candidate = CandidateConfig {
            handler: HandlerKind::SalesConsultant,
            base_score: 0.8,
        };
        let route = RouteConfig {
            category: RequestCategory::Sales,
            candidates: vec![candidate.clone(), candidate],
        };
        let mut config = TriageConfig::default();
        config.routing.routes = vec![route.clone(), route];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "duplicate route"));
        assert!(has_message(&errors, "listed twice"));
    }

    #[test]
    fn base_score_out_of_range_fails() {
        let mut config = TriageConfig::default();
        config.routing.routes.push(RouteConfig {
            category: RequestCategory::Report,
            candidates: vec![CandidateConfig {
                handler: HandlerKind::ReportAnalyst,
                base_score: -0.1,
            }],
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "base_score"));
    }

    #[test]
    fn inverted_multiplier_bounds_fail() {
        let mut config = TriageConfig::default();
        config.performance.floor = 1.1;
        config.performance.ceiling = 0.9;
        config.performance.failure_factor = 1.2;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "performance.floor"));
        assert!(has_message(&errors, "performance.ceiling"));
        assert!(has_message(&errors, "performance.failure_factor"));
    }

    #[test]
    fn zero_capacity_fails() {
        let mut config = TriageConfig::default();
        config.session.history_capacity = 0;
        config.retrieval.max_structured_tokens = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn blank_display_name_fails() {
        let mut config = TriageConfig::default();
        config.handlers.insert(
            HandlerKind::Recommender,
            HandlerConfig {
                enabled: true,
                display_name: Some("  ".into()),
            },
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "handlers.recommender.display_name"));
    }

    fn parse(toml_content: &str) -> TriageConfig {
        toml::from_str(toml_content).unwrap()
    }

    #[test]
    fn non_finite_multiplier_settings_fail() {
        for value in ["nan", "inf", "-inf"] {
            let config = parse(&format!(
                "[performance]\nceiling = {value}\nfloor = {value}\nsuccess_factor = {value}\nfailure_factor = {value}\n"
            ));
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 4, "{value}");
        }
    }

    #[test]
    fn multiplier_bounds_beyond_hard_limits_fail() {
        let config = parse("[performance]\nceiling = 5.0\nfloor = 0.1\n");
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "performance.ceiling must be within 1.0..=1.2"));
        assert!(has_message(&errors, "performance.floor must be within 0.5..=1.0"));
    }

    #[test]
    fn tighter_multiplier_bounds_pass() {
        let config = parse("[performance]\nceiling = 1.1\nfloor = 0.8\n");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn oversized_sweep_interval_fails() {
        let config = parse("[session]\nsweep_interval_secs = 9223372036854775807\n");
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "session.sweep_interval_secs"));
    }
}
