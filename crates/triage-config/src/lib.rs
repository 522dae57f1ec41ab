// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Triage routing core.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! Configuration faults are the only fatal errors in the system: they are
//! reported once at startup, never per request.
//!
//! # Usage
//!
//! ```no_run
//! use triage_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("history capacity: {}", config.session.history_capacity);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::TriageConfig;

use tracing::debug;

/// Load configuration from the XDG hierarchy and validate it.
///
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to miette diagnostics with typo suggestions
pub fn load_and_validate() -> Result<TriageConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            debug!(
                routes = config.routing.routes.len(),
                handler_overrides = config.handlers.len(),
                "configuration loaded"
            );
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<TriageConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    if let Ok(content) = std::fs::read_to_string(loader::LOCAL_CONFIG_FILE) {
        let path = std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_FILE).display().to_string())
            .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.to_string());
        sources.push((path, content));
    }

    if let Some(path) = loader::user_config_path()
        && let Ok(content) = std::fs::read_to_string(&path)
    {
        sources.push((path.display().to_string(), content));
    }

    if let Ok(content) = std::fs::read_to_string(loader::SYSTEM_CONFIG_PATH) {
        sources.push((loader::SYSTEM_CONFIG_PATH.to_string(), content));
    }

    sources
}
