// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnema memory engine.

use thiserror::Error;

/// The primary error type used across all Mnema adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MnemaError {
    /// Input validation errors (unknown category, mismatched batch lengths,
    /// importance out of range, empty update).
    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// Embedding provider errors (model failure, dimension mismatch).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Backing store errors (vector index or metadata store failure).
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, out-of-range settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MnemaError {
    /// Builds a [`MnemaError::Validation`] for the named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wraps a backend error as [`MnemaError::Store`].
    pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store {
            source: Box::new(source),
        }
    }

    /// Builds a sourceless [`MnemaError::Embedding`].
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_construct_and_display() {
        let v = MnemaError::validation("category", "unknown category `blog`");
        assert!(format!("{v}").contains("category"));

        let e = MnemaError::embedding("provider returned no vectors");
        assert!(format!("{e}").contains("embedding error"));

        let s = MnemaError::store(std::io::Error::other("disk full"));
        assert!(format!("{s}").contains("disk full"));

        let c = MnemaError::Config("bad toml".into());
        assert!(format!("{c}").contains("configuration"));

        let t = MnemaError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        assert!(format!("{t}").contains("timed out"));

        let i = MnemaError::Internal("unexpected".into());
        assert!(format!("{i}").contains("internal"));
    }

    #[test]
    fn store_error_preserves_source() {
        let err = MnemaError::store(std::io::Error::other("io boom"));
        let MnemaError::Store { source } = err else {
            panic!("expected Store variant");
        };
        assert_eq!(source.to_string(), "io boom");
    }
}
