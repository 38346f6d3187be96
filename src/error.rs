//! Error types for HeartRisk.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the failure class (malformed input, inference failure, model loading)
//! and turn it into the right user-visible message.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed raw input. Aborts the whole request; no partial evidence is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvidenceError {
    #[error("Pair '{pair}' is missing the '=' separator")]
    MissingSeparator {
        pair: String,
    },

    #[error("Field '{key}' has an empty value")]
    EmptyValue {
        key: String,
    },

    #[error("Value '{token}' is not recognized for field '{field}'")]
    UnknownAlias {
        field: String,
        token: String,
    },

    #[error("Required form field '{field}' is missing")]
    MissingFormField {
        field: String,
    },
}

/// Errors raised by the inference engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Variable '{variable}' is not part of the network")]
    UnknownVariable {
        variable: String,
    },

    #[error("State '{state}' is not valid for '{variable}'. Expected one of: {}", expected.join(", "))]
    UnknownState {
        variable: String,
        state: String,
        expected: Vec<String>,
    },

    #[error("Evidence has zero probability under the network")]
    ImpossibleEvidence,

    #[error("Target variable '{target}' is also given as evidence")]
    TargetObserved {
        target: String,
    },

    #[error("Posterior for '{target}' does not sum to 1 (sum: {sum})")]
    InvalidPosterior {
        target: String,
        sum: f64,
    },
}

/// Errors raised while loading or validating a network file.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode model: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Variable '{variable}' is declared more than once")]
    DuplicateVariable {
        variable: String,
    },

    #[error("Variable '{variable}' has no states")]
    NoStates {
        variable: String,
    },

    #[error("CPD references unknown variable '{variable}'")]
    UnknownVariable {
        variable: String,
    },

    #[error("Variable '{variable}' has {count} CPDs, expected exactly 1")]
    CpdCount {
        variable: String,
        count: usize,
    },

    #[error("CPD for '{variable}' has shape {rows}x{columns}, expected {expected_rows}x{expected_columns}")]
    CpdShape {
        variable: String,
        rows: usize,
        columns: usize,
        expected_rows: usize,
        expected_columns: usize,
    },

    #[error("CPD for '{variable}' column {column} sums to {sum}, expected 1")]
    CpdNotNormalized {
        variable: String,
        column: usize,
        sum: f64,
    },

    #[error("CPD for '{variable}' contains invalid probability {value}")]
    InvalidProbability {
        variable: String,
        value: f64,
    },

    #[error("Network contains a cycle through '{variable}'")]
    Cycle {
        variable: String,
    },
}

/// Top-level error type for HeartRisk.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Format error: {0}")]
    Format(#[from] EvidenceError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl RiskError {
    /// Returns true if this is a malformed-input error.
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Returns true if this is an inference error.
    #[must_use]
    pub const fn is_inference(&self) -> bool {
        matches!(self, Self::Inference(_))
    }

    /// Returns true if this is a model loading error.
    #[must_use]
    pub const fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for HeartRisk operations.
pub type RiskResult<T> = Result<T, RiskError>;
