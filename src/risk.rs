//! Risk classification.
//!
//! Maps the posterior probability of the disease-present state onto a
//! fixed risk tier. Thresholds are inclusive at each tier's lower bound.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::inference::Posterior;

/// Disease-present state name used by the trained network.
pub const DEFAULT_POSITIVE_STATE: &str = "Heart-Disease";

/// Lower bound (percent) of the high tier.
pub const HIGH_RISK_THRESHOLD: f64 = 70.0;

/// Lower bound (percent) of the moderate tier.
pub const MODERATE_RISK_THRESHOLD: f64 = 40.0;

/// Discrete risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    /// Disease-present probability below 40%.
    #[serde(rename = "Low Risk")]
    Low,
    /// Disease-present probability in [40%, 70%).
    #[serde(rename = "Moderate Risk")]
    Moderate,
    /// Disease-present probability of 70% or more.
    #[serde(rename = "High Risk")]
    High,
    /// The disease-present state is missing from the posterior.
    Unknown,
}

impl RiskTier {
    /// Tier for a disease-present probability expressed in percent.
    ///
    /// The percentage is rounded to two decimals first, matching what is displayed.
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        let percent = (percent * 100.0).round() / 100.0;
        if percent >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if percent >= MODERATE_RISK_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
            Self::Unknown => "Unknown",
        }
    }

    /// Display color.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#34C759",
            Self::Moderate => "#FF9500",
            Self::High => "#FF3B30",
            Self::Unknown => "#8E8E93",
        }
    }

    /// Icon token.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Low => "check-circle",
            Self::Moderate => "exclamation-circle",
            Self::High => "exclamation-triangle",
            Self::Unknown => "question-circle",
        }
    }

    /// Recommendation sentence.
    #[must_use]
    pub const fn recommendation(self) -> &'static str {
        match self {
            Self::Low => "Continue healthy lifestyle. Regular check-ups recommended.",
            Self::Moderate => {
                "Schedule appointment with healthcare provider. Lifestyle modifications advised."
            }
            Self::High => {
                "Immediate medical consultation recommended. Consider comprehensive cardiac evaluation."
            }
            Self::Unknown => "Unable to assess risk.",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Risk payload handed to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Tier label, e.g. `"High Risk"`.
    pub level: String,
    /// Display color.
    pub color: String,
    /// Recommendation sentence.
    pub recommendation: String,
    /// Icon token.
    pub icon: String,
}

impl From<RiskTier> for RiskAssessment {
    fn from(tier: RiskTier) -> Self {
        Self {
            level: tier.label().to_string(),
            color: tier.color().to_string(),
            recommendation: tier.recommendation().to_string(),
            icon: tier.icon().to_string(),
        }
    }
}

/// Classifies posteriors by the probability of one named state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskClassifier {
    positive_state: String,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIVE_STATE)
    }
}

impl RiskClassifier {
    /// Creates a classifier keyed on `positive_state`.
    #[must_use]
    pub fn new(positive_state: impl Into<String>) -> Self {
        Self {
            positive_state: positive_state.into(),
        }
    }

    /// The disease-present state name.
    #[must_use]
    pub fn positive_state(&self) -> &str {
        &self.positive_state
    }

    /// Tier for `posterior`; `Unknown` if the positive state is absent.
    #[must_use]
    pub fn classify(&self, posterior: &Posterior) -> RiskTier {
        match posterior.probability(&self.positive_state) {
            Some(p) => RiskTier::from_percent(p * 100.0),
            None => {
                tracing::warn!(
                    state = %self.positive_state,
                    target_var = posterior.target(),
                    "positive state missing from posterior"
                );
                RiskTier::Unknown
            }
        }
    }
}
