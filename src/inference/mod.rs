//! Inference layer.
//!
//! The [`InferenceEngine`] trait is the seam to the probabilistic engine;
//! [`InferenceAdapter`] binds an engine to the fixed target variable and
//! owns percentage formatting for display.

mod adapter;
mod posterior;

use crate::error::InferenceError;
use crate::evidence::EvidenceMap;

pub use adapter::{format_percentage, InferenceAdapter, DEFAULT_TARGET};
pub use posterior::{Posterior, StateProbability, POSTERIOR_TOLERANCE};

/// Exact marginal inference over a discrete network.
///
/// Implementations must be read-only after construction so one instance can
/// serve concurrent requests.
pub trait InferenceEngine: Send + Sync {
    /// Computes `P(target | evidence)` as per-state marginals.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError` if the target or an evidence variable is not
    /// in the network, an evidence state is not trained, or the evidence has
    /// zero probability.
    fn query(&self, target: &str, evidence: &EvidenceMap) -> Result<Posterior, InferenceError>;

    /// Node names.
    fn variables(&self) -> Vec<String>;

    /// Ordered states of `variable`, if it exists.
    fn states(&self, variable: &str) -> Option<Vec<String>>;
}
