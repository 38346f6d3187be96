use std::sync::Arc;

use crate::error::InferenceError;
use crate::evidence::EvidenceMap;
use crate::inference::{InferenceEngine, Posterior};

/// Outcome variable queried by default.
pub const DEFAULT_TARGET: &str = "target";

/// Formats a probability in [0, 1] as a percentage with two decimals (`0.6321` → `"63.21%"`).
#[must_use]
pub fn format_percentage(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Binds an inference engine to the fixed outcome variable.
#[derive(Clone)]
pub struct InferenceAdapter {
    engine: Arc<dyn InferenceEngine>,
    target: String,
}

impl std::fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl InferenceAdapter {
    /// Creates an adapter querying `target`.
    #[must_use]
    pub fn new(engine: Arc<dyn InferenceEngine>, target: impl Into<String>) -> Self {
        Self {
            engine,
            target: target.into(),
        }
    }

    /// The outcome variable.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn InferenceEngine> {
        &self.engine
    }

    /// Queries the posterior over the target.
    ///
    /// Failures are returned as-is; there is no fallback distribution.
    ///
    /// # Errors
    ///
    /// Propagates `InferenceError` from the engine.
    pub fn query(&self, evidence: &EvidenceMap) -> Result<Posterior, InferenceError> {
        match self.engine.query(&self.target, evidence) {
            Ok(posterior) => {
                tracing::debug!(
                    target_var = %self.target,
                    observed = evidence.len(),
                    states = posterior.states().len(),
                    "posterior computed"
                );
                Ok(posterior)
            }
            Err(err) => {
                tracing::warn!(target_var = %self.target, error = %err, "inference failed");
                Err(err)
            }
        }
    }

    /// Display percentages for each target state, in network order.
    #[must_use]
    pub fn percentages(posterior: &Posterior) -> Vec<(String, String)> {
        posterior
            .states()
            .iter()
            .map(|s| (s.state.clone(), format_percentage(s.probability)))
            .collect()
    }
}
