use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Posterior probabilities must sum to 1 within this tolerance (0.01%).
pub const POSTERIOR_TOLERANCE: f64 = 1e-4;

/// Probability of a single target state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateProbability {
    /// State name as trained.
    pub state: String,
    /// Probability in [0.0, 1.0].
    pub probability: f64,
}

/// Distribution over the target variable after conditioning on evidence.
///
/// - States keep the network's order.
/// - Probabilities are finite, non-negative and sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posterior {
    target: String,
    states: Vec<StateProbability>,
}

impl Posterior {
    /// Construct a validated posterior.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::InvalidPosterior` if the entries are empty,
    /// contain a negative or non-finite value, or do not sum to 1.
    pub fn new(
        target: impl Into<String>,
        entries: Vec<(String, f64)>,
    ) -> Result<Self, InferenceError> {
        let target = target.into();
        let sum: f64 = entries.iter().map(|(_, p)| p).sum();
        let valid = !entries.is_empty()
            && entries.iter().all(|(_, p)| p.is_finite() && *p >= 0.0)
            && (sum - 1.0).abs() <= POSTERIOR_TOLERANCE;
        if !valid {
            return Err(InferenceError::InvalidPosterior { target, sum });
        }

        Ok(Self {
            target,
            states: entries
                .into_iter()
                .map(|(state, probability)| StateProbability { state, probability })
                .collect(),
        })
    }

    /// The target variable.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// States in network order.
    #[must_use]
    pub fn states(&self) -> &[StateProbability] {
        &self.states
    }

    /// Probability of `state`, matched exactly.
    #[must_use]
    pub fn probability(&self, state: &str) -> Option<f64> {
        self.states
            .iter()
            .find(|s| s.state == state)
            .map(|s| s.probability)
    }

    /// Sum of all state probabilities.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.states.iter().map(|s| s.probability).sum()
    }

    /// The most probable state.
    #[must_use]
    pub fn most_likely(&self) -> Option<&StateProbability> {
        self.states
            .iter()
            .max_by(|a, b| a.probability.total_cmp(&b.probability))
    }
}

impl<'de> Deserialize<'de> for Posterior {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            target: String,
            states: Vec<StateProbability>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let entries = raw
            .states
            .into_iter()
            .map(|s| (s.state, s.probability))
            .collect();
        Posterior::new(raw.target, entries).map_err(serde::de::Error::custom)
    }
}
