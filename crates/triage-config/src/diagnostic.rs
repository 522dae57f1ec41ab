// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! source spans and "did you mean?" hints. Unknown handler and category
//! names get the same treatment as unknown keys, since both are closed sets.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;
use triage_core::{HandlerKind, RequestCategory};

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(triage::config::unknown_key),
        help("{}", format_suggestion_help(suggestion.as_deref(), valid))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A handler or category name outside the closed set.
    #[error("unknown {kind} `{name}`")]
    #[diagnostic(
        code(triage::config::unknown_name),
        help("{}", format_suggestion_help(suggestion.as_deref(), valid))
    )]
    UnknownName {
        /// "handler" or "category".
        kind: &'static str,
        name: String,
        suggestion: Option<String>,
        valid: String,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(triage::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(triage::config::missing_key),
        help("add `{key} = <value>` to your triage.toml")
    )]
    MissingKey { key: String },

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(triage::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(triage::config::other))]
    Other(String),
}

fn format_suggestion_help(suggestion: Option<&str>, valid: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid values: {valid}"),
        None => format!("valid values: {valid}"),
    }
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    let mut errors = Vec::new();

    for error in err {
        let config_error = match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let suggestion = suggest_key(field, &valid_keys);
                let (span, src) = find_source_span(&error, field, toml_sources);

                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion,
                    valid: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::UnknownVariant(name, _) => unknown_name(name, &error.path),
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(format!("{error}")),
        };

        errors.push(config_error);
    }

    errors
}

/// Build an `UnknownName` diagnostic, guessing from the path whether a
/// handler or a category was misspelled.
fn unknown_name(name: &str, path: &[String]) -> ConfigError {
    let is_category = path.last().is_some_and(|p| p == "category");
    let (kind, valid): (&'static str, Vec<&'static str>) = if is_category {
        (
            "category",
            RequestCategory::ALL
                .iter()
                .map(|&c| <&'static str>::from(c))
                .collect(),
        )
    } else {
        ("handler", HandlerKind::ALL.iter().map(|h| h.as_str()).collect())
    };
    ConfigError::UnknownName {
        kind,
        name: name.to_string(),
        suggestion: suggest_key(name, &valid),
        valid: valid.join(", "),
    }
}

/// Find source span for an error in the TOML source files.
fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = source_path.as_ref().and_then(|path| {
        toml_sources
            .iter()
            .find(|(p, _)| p == path)
            .map(|(p, content)| (p.as_str(), content.as_str()))
    });

    if let Some((path, content)) = source
        && let Some(offset) = find_key_offset(content, &error.path, field)
    {
        let span = SourceSpan::new(offset.into(), field.len());
        let named = NamedSource::new(path, content.to_string());
        return (Some(span), Some(named));
    }

    (None, None)
}

/// Find the byte offset of a key in TOML content, relative to a section path.
///
/// For `path = ["handlers", "recommender"]` and `field = "enabeld"`, finds the
/// `[handlers.recommender]` header then searches for `enabeld` after it.
/// Array-of-table headers (`[[routing.routes]]`) are matched as well. For
/// top-level fields, searches from the start.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = if path.is_empty() {
        0
    } else {
        // Numeric segments are array indices, not part of the header.
        let section = path
            .iter()
            .filter(|s| s.parse::<usize>().is_err())
            .cloned()
            .collect::<Vec<_>>()
            .join(".");
        let table = format!("[{section}]");
        let array = format!("[[{section}]]");
        content
            .find(&array)
            .map(|pos| pos + array.len())
            .or_else(|| content.find(&table).map(|pos| pos + table.len()))?
    };

    let remaining = &content[search_start..];

    let mut byte_offset = 0;
    for line in remaining.lines() {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && (after.starts_with(' ') || after.starts_with('=') || after.starts_with('\t'))
        {
            let field_start_in_line = line.len() - trimmed.len();
            return Some(search_start + byte_offset + field_start_in_line);
        }
        byte_offset += line.len() + 1; // +1 for newline
    }

    None
}

/// Suggest a similar key or name using Jaro-Winkler string similarity.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let mut best_score = SUGGESTION_THRESHOLD;
    let mut best_match = None;

    for &key in valid_keys {
        let score = strsim::jaro_winkler(unknown, key);
        if score > best_score {
            best_score = score;
            best_match = Some(key.to_string());
        }
    }

    best_match
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
