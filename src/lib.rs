//! # HeartRisk - Evidence normalization and risk classification
//!
//! HeartRisk estimates heart-disease risk from a fixed set of clinical and
//! demographic factors using a pre-trained discrete Bayesian network. It
//! turns loosely formatted user input into the exact state vocabulary the
//! network was trained with, runs exact inference over the outcome variable,
//! and maps the result onto an actionable risk tier.
//!
//! ## Core Concepts
//!
//! - **Field**: A clinical variable with a closed set of canonical states
//! - **Evidence**: Observed `field = state` assignments, restricted to model nodes
//! - **Posterior**: Distribution over the outcome after conditioning on evidence
//! - **RiskTier**: Low / Moderate / High / Unknown, with a recommendation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use heartrisk::{RiskConfig, RiskPipeline};
//!
//! let config = RiskConfig::from_env()?;
//! let pipeline = RiskPipeline::from_config(&config)?;
//!
//! let assessment = pipeline.assess_message("sex=male, age=middle-aged, ca=two")?;
//! println!("{}", assessment.tier);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Vocabulary, evidence and classification
pub mod config;
pub mod error;
pub mod evidence;
pub mod risk;
pub mod vocabulary;

// Inference
pub mod inference;
pub mod network;

// Assembly and front-ends
pub mod frontend;
pub mod pipeline;

// Re-export primary types at crate root for convenience
pub use config::{ConfigError, RiskConfig};
pub use error::{EvidenceError, InferenceError, ModelError, RiskError, RiskResult};
pub use evidence::{build_evidence, parse_message, EvidenceMap, EvidenceNormalizer, RawPair};
pub use inference::{
    format_percentage, InferenceAdapter, InferenceEngine, Posterior, StateProbability,
    DEFAULT_TARGET,
};
pub use network::{load_model, DiscreteNetwork, ModelInfo, NetworkSpec, VariableElimination};
pub use pipeline::{Assessment, AssessmentId, RiskPipeline};
pub use risk::{RiskAssessment, RiskClassifier, RiskTier, DEFAULT_POSITIVE_STATE};
pub use vocabulary::{canonicalize, AliasPolicy, Field, Vocabulary, MODEL_NODES};

pub use frontend::{ChatFrontend, FormFrontend, FormReport, FormSubmission};

/// Crate version, for banners and logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
