//! The shared assessment pipeline.
//!
//! raw input → [`EvidenceNormalizer`] → [`EvidenceMap`] → [`InferenceAdapter`]
//! → [`Posterior`] → [`RiskClassifier`] → [`Assessment`].
//!
//! A pipeline is built once at startup and is immutable afterwards; front-ends
//! share it behind an `Arc` and call it concurrently.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::error::RiskResult;
use crate::evidence::{parse_message, EvidenceMap, EvidenceNormalizer, RawPair};
use crate::inference::{InferenceAdapter, InferenceEngine, Posterior};
use crate::network::{load_model, DiscreteNetwork, ModelInfo, VariableElimination};
use crate::risk::{RiskAssessment, RiskClassifier, RiskTier};
use crate::vocabulary::Vocabulary;

/// Correlation ID for one assessment. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentId(uuid::Uuid);

impl AssessmentId {
    /// Creates a new random assessment ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AssessmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of assessing one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    /// Correlation ID.
    pub id: AssessmentId,
    /// When the assessment was computed.
    pub assessed_at: DateTime<Utc>,
    /// Evidence actually submitted to inference.
    pub evidence: EvidenceMap,
    /// Posterior over the target variable.
    pub posterior: Posterior,
    /// Display percentages per target state, in network order.
    pub probabilities: Vec<(String, String)>,
    /// Risk tier of the disease-present probability.
    pub tier: RiskTier,
}

impl Assessment {
    /// Presentation payload for the tier.
    #[must_use]
    pub fn interpretation(&self) -> RiskAssessment {
        RiskAssessment::from(self.tier)
    }
}

/// Evidence normalization, inference and classification behind one handle.
#[derive(Debug, Clone)]
pub struct RiskPipeline {
    normalizer: EvidenceNormalizer,
    adapter: InferenceAdapter,
    classifier: RiskClassifier,
    model_info: Option<ModelInfo>,
}

impl RiskPipeline {
    /// Assembles a pipeline around an already constructed engine.
    #[must_use]
    pub fn new(engine: Arc<dyn InferenceEngine>, config: &RiskConfig) -> Self {
        Self {
            normalizer: EvidenceNormalizer::new(Vocabulary::new(config.alias_policy)),
            adapter: InferenceAdapter::new(engine, config.target.clone()),
            classifier: RiskClassifier::new(config.positive_state.clone()),
            model_info: None,
        }
    }

    /// Assembles a pipeline running variable elimination over `network`.
    #[must_use]
    pub fn from_network(network: DiscreteNetwork, config: &RiskConfig) -> Self {
        let info = network.info();
        let mut pipeline = Self::new(Arc::new(VariableElimination::new(network)), config);
        pipeline.model_info = Some(info);
        pipeline
    }

    /// Loads the configured model file and assembles the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::Config` for an invalid configuration or
    /// `RiskError::Model` if the network cannot be loaded.
    pub fn from_config(config: &RiskConfig) -> RiskResult<Self> {
        config.validate()?;
        let network = load_model(&config.model_path)?;
        Ok(Self::from_network(network, config))
    }

    /// The evidence normalizer.
    #[must_use]
    pub const fn normalizer(&self) -> &EvidenceNormalizer {
        &self.normalizer
    }

    /// The inference adapter.
    #[must_use]
    pub const fn adapter(&self) -> &InferenceAdapter {
        &self.adapter
    }

    /// The risk classifier.
    #[must_use]
    pub const fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    /// Structure of the loaded network, when built from one.
    #[must_use]
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model_info.as_ref()
    }

    /// Runs inference and classification on an already built evidence map.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::Inference` if the engine rejects the evidence.
    pub fn assess_evidence(&self, evidence: EvidenceMap) -> RiskResult<Assessment> {
        let id = AssessmentId::new();
        let posterior = self.adapter.query(&evidence)?;
        let probabilities = InferenceAdapter::percentages(&posterior);
        let tier = self.classifier.classify(&posterior);
        tracing::info!(
            assessment = %id,
            observed = evidence.len(),
            tier = %tier,
            "assessment completed"
        );

        Ok(Assessment {
            id,
            assessed_at: Utc::now(),
            evidence,
            posterior,
            probabilities,
            tier,
        })
    }

    /// Normalizes raw pairs and assesses them.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::Format` for malformed pairs (nothing is queried)
    /// or `RiskError::Inference` if inference fails.
    pub fn assess(&self, raw_pairs: &[RawPair]) -> RiskResult<Assessment> {
        let evidence = self.normalizer.build(raw_pairs)?;
        self.assess_evidence(evidence)
    }

    /// Parses a `key=value, key=value` message and assesses it.
    ///
    /// # Errors
    ///
    /// See [`RiskPipeline::assess`].
    pub fn assess_message(&self, text: &str) -> RiskResult<Assessment> {
        let pairs = parse_message(text)?;
        self.assess(&pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvidenceError, InferenceError, RiskError};
    use crate::vocabulary::{AliasPolicy, Field};

    /// Engine reporting a fixed disease probability and recording nothing.
    struct ConstantEngine(f64);

    impl InferenceEngine for ConstantEngine {
        fn query(&self, target: &str, evidence: &EvidenceMap) -> Result<Posterior, InferenceError> {
            if let Some(state) = evidence.get(Field::Cp) {
                if state != "Typical-Angina" {
                    return Err(InferenceError::UnknownState {
                        variable: "cp".to_string(),
                        state: state.to_string(),
                        expected: vec!["Typical-Angina".to_string()],
                    });
                }
            }
            Posterior::new(
                target,
                vec![
                    ("No-Heart-Disease".to_string(), 1.0 - self.0),
                    ("Heart-Disease".to_string(), self.0),
                ],
            )
        }

        fn variables(&self) -> Vec<String> {
            Vec::new()
        }

        fn states(&self, _variable: &str) -> Option<Vec<String>> {
            None
        }
    }

    fn pipeline(p: f64) -> RiskPipeline {
        RiskPipeline::new(Arc::new(ConstantEngine(p)), &RiskConfig::default())
    }

    #[test]
    fn test_assess_message() {
        let assessment = pipeline(0.75).assess_message("sex=male, cp=typical-angina").unwrap();
        assert_eq!(assessment.tier, RiskTier::High);
        assert_eq!(assessment.evidence.get(Field::Sex), Some("Male"));
        assert_eq!(
            assessment.probabilities,
            vec![
                ("No-Heart-Disease".to_string(), "25.00%".to_string()),
                ("Heart-Disease".to_string(), "75.00%".to_string()),
            ]
        );
        assert_eq!(assessment.interpretation().level, "High Risk");
    }

    #[test]
    fn test_format_error_aborts_before_inference() {
        let err = pipeline(0.5).assess_message("sex=male, hello").unwrap_err();
        assert!(err.is_format());
        assert!(matches!(
            err,
            RiskError::Format(EvidenceError::MissingSeparator { .. })
        ));
    }

    #[test]
    fn test_pass_through_token_fails_in_inference() {
        let err = pipeline(0.5).assess_message("cp=sharp").unwrap_err();
        assert!(err.is_inference());
        assert!(err.to_string().contains("sharp"));
    }

    #[test]
    fn test_strict_policy_fails_in_normalization() {
        let config = RiskConfig {
            alias_policy: AliasPolicy::Strict,
            ..RiskConfig::default()
        };
        let pipeline = RiskPipeline::new(Arc::new(ConstantEngine(0.5)), &config);
        assert!(pipeline.assess_message("cp=sharp").unwrap_err().is_format());
    }

    #[test]
    fn test_assessment_ids_are_unique() {
        let p = pipeline(0.1);
        let a = p.assess_message("sex=female").unwrap();
        let b = p.assess_message("sex=female").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.tier, RiskTier::Low);
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RiskPipeline>();
    }
}
