// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-negative weights and non-empty category sets.

use thiserror::Error;

use crate::model::MnemaConfig;

/// A single configuration validation failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConfigIssue {
    pub message: String,
}

impl ConfigIssue {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err` with all collected
/// validation errors (does not fail fast).
pub fn validate_config(config: &MnemaConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut errors = Vec::new();

    if config.memory.categories.is_empty() {
        errors.push(ConfigIssue::new("memory.categories must not be empty"));
    }
    for category in &config.memory.categories {
        if category.trim().is_empty() {
            errors.push(ConfigIssue::new(
                "memory.categories must not contain blank names",
            ));
        }
    }

    for (name, weight) in [
        ("retrieval.similarity_weight", config.retrieval.similarity_weight),
        ("retrieval.recency_weight", config.retrieval.recency_weight),
        ("retrieval.importance_weight", config.retrieval.importance_weight),
    ] {
        if !(0.0..=1.0).contains(&weight) {
            errors.push(ConfigIssue::new(format!(
                "{name} must be within [0.0, 1.0], got {weight}"
            )));
        }
    }

    if config.retrieval.default_limit == 0 {
        errors.push(ConfigIssue::new("retrieval.default_limit must be at least 1"));
    }
    if config.retrieval.context_token_limit == 0 {
        errors.push(ConfigIssue::new(
            "retrieval.context_token_limit must be at least 1",
        ));
    }
    if config.retrieval.operation_timeout_secs == 0 {
        errors.push(ConfigIssue::new(
            "retrieval.operation_timeout_secs must be at least 1",
        ));
    }
    if config.context.window_size == 0 {
        errors.push(ConfigIssue::new("context.window_size must be at least 1"));
    }
    if config.cache.max_entries == 0 {
        errors.push(ConfigIssue::new("cache.max_entries must be at least 1"));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&MnemaConfig::default()).is_ok());
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let mut config = MnemaConfig::default();
        config.retrieval.similarity_weight = 1.5;
        let errors = validate_config(&config).expect_err("weight out of range");
        assert!(errors.iter().any(|e| e.message.contains("similarity_weight")));
    }

    #[test]
    fn empty_category_set_is_rejected() {
        let mut config = MnemaConfig::default();
        config.memory.categories.clear();
        let errors = validate_config(&config).expect_err("empty categories");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = MnemaConfig::default();
        config.memory.categories.clear();
        config.context.window_size = 0;
        config.retrieval.recency_weight = -0.1;
        let errors = validate_config(&config).expect_err("multiple issues");
        assert_eq!(errors.len(), 3);
    }
}
