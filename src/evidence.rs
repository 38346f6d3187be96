//! Evidence normalization.
//!
//! Turns raw `key=value` input into an [`EvidenceMap`] holding only model
//! nodes mapped to canonical states. Any malformed pair aborts the whole
//! request so a partially applied query is never run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EvidenceError;
use crate::vocabulary::{Field, Vocabulary, MODEL_NODES};

/// A raw, un-normalized `key=value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPair {
    /// Field name as typed by the user.
    pub key: String,
    /// Value as typed by the user.
    pub value: String,
}

impl RawPair {
    /// Creates a pair from an already separated key and value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Splits `raw` on the first `=`.
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError::MissingSeparator` if there is no `=`.
    pub fn parse(raw: &str) -> Result<Self, EvidenceError> {
        let raw = raw.trim();
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| EvidenceError::MissingSeparator {
                pair: raw.to_string(),
            })?;
        Ok(Self::new(key, value))
    }
}

/// Splits a conversational message (`"sex=male, ca=2"`) into raw pairs.
///
/// # Errors
///
/// Returns the first format error; no pairs are returned in that case.
pub fn parse_message(text: &str) -> Result<Vec<RawPair>, EvidenceError> {
    text.split(',').map(RawPair::parse).collect()
}

/// Observed `field = state` assignments conditioning one query.
///
/// Only model nodes can be present, each at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceMap(BTreeMap<Field, String>);

impl EvidenceMap {
    /// Creates an empty evidence map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the state of a field, replacing any earlier value.
    pub fn insert(&mut self, field: Field, state: impl Into<String>) -> Option<String> {
        self.0.insert(field, state.into())
    }

    /// Returns the state assigned to `field`, if observed.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Returns true if `field` is observed.
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Number of observed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(node name, state)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, state)| (field.name(), state.as_str()))
    }

    /// Observed fields in field order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }
}

/// Builds an evidence map from raw pairs.
///
/// Each pair is canonicalized through `vocabulary`; fields outside
/// `model_nodes`, including pairs with an empty name, are dropped. A repeated
/// field keeps its last value.
///
/// # Errors
///
/// Returns `EvidenceError` for an empty model-node value, or for an unknown
/// alias under the strict policy. Nothing is returned on error.
pub fn build_evidence(
    raw_pairs: &[RawPair],
    model_nodes: &[Field],
    vocabulary: &Vocabulary,
) -> Result<EvidenceMap, EvidenceError> {
    let mut evidence = EvidenceMap::new();
    let mut dropped: Vec<String> = Vec::new();

    for pair in raw_pairs {
        let Some(field) = Field::from_name(&pair.key).filter(|f| model_nodes.contains(f)) else {
            dropped.push(pair.key.trim().to_lowercase());
            continue;
        };
        if pair.value.trim().is_empty() {
            return Err(EvidenceError::EmptyValue {
                key: field.name().to_string(),
            });
        }

        let (_, value) = vocabulary.resolve(field.name(), &pair.value)?;
        evidence.insert(field, value);
    }

    tracing::debug!(
        observed = evidence.len(),
        dropped = ?dropped,
        "evidence built"
    );
    Ok(evidence)
}

/// Normalizer bound to a vocabulary and the network's model nodes.
#[derive(Debug, Clone)]
pub struct EvidenceNormalizer {
    vocabulary: Vocabulary,
    model_nodes: Vec<Field>,
}

impl Default for EvidenceNormalizer {
    fn default() -> Self {
        Self::new(Vocabulary::default())
    }
}

impl EvidenceNormalizer {
    /// Creates a normalizer over the standard model nodes.
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            model_nodes: MODEL_NODES.to_vec(),
        }
    }

    /// Restricts evidence to a custom set of model nodes.
    #[must_use]
    pub fn with_model_nodes(mut self, model_nodes: Vec<Field>) -> Self {
        self.model_nodes = model_nodes;
        self
    }

    /// The vocabulary used for canonicalization.
    #[must_use]
    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Fields retained in evidence.
    #[must_use]
    pub fn model_nodes(&self) -> &[Field] {
        &self.model_nodes
    }

    /// Normalizes already separated pairs.
    ///
    /// # Errors
    ///
    /// See [`build_evidence`].
    pub fn build(&self, raw_pairs: &[RawPair]) -> Result<EvidenceMap, EvidenceError> {
        build_evidence(raw_pairs, &self.model_nodes, &self.vocabulary)
    }

    /// Parses and normalizes a comma-separated conversational message.
    ///
    /// # Errors
    ///
    /// See [`parse_message`] and [`build_evidence`].
    pub fn parse(&self, text: &str) -> Result<EvidenceMap, EvidenceError> {
        let pairs = parse_message(text)?;
        self.build(&pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::AliasPolicy;

    #[test]
    fn test_raw_pair_splits_on_first_equals() {
        let pair = RawPair::parse(" note=a=b ").unwrap();
        assert_eq!(pair, RawPair::new("note", "a=b"));
    }

    #[test]
    fn test_raw_pair_missing_separator() {
        assert_eq!(
            RawPair::parse("hello"),
            Err(EvidenceError::MissingSeparator {
                pair: "hello".to_string()
            })
        );
    }

    #[test]
    fn test_parse_message_aborts_on_any_bad_pair() {
        let err = parse_message("sex=male, age, ca=2").unwrap_err();
        assert_eq!(
            err,
            EvidenceError::MissingSeparator {
                pair: "age".to_string()
            }
        );
    }

    #[test]
    fn test_parse_message_empty_input() {
        assert!(parse_message("").is_err());
        assert!(parse_message("sex=male,").is_err());
    }

    #[test]
    fn test_build_drops_informational_fields() {
        let pairs = parse_message("chol=high, fbs=true, restecg=normal, oldpeak=low, sex=female").unwrap();
        let evidence = build_evidence(&pairs, &MODEL_NODES, &Vocabulary::default()).unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence.get(Field::Sex), Some("Female"));
        assert!(!evidence.contains(Field::Chol));
    }

    #[test]
    fn test_build_drops_unknown_fields() {
        let pairs = vec![RawPair::new("weight", "heavy"), RawPair::new("ca", "one")];
        let evidence = build_evidence(&pairs, &MODEL_NODES, &Vocabulary::default()).unwrap();
        assert_eq!(evidence.iter().collect::<Vec<_>>(), vec![("ca", "1")]);
    }

    #[test]
    fn test_build_last_write_wins() {
        let pairs = parse_message("ca=one, CA=three").unwrap();
        let evidence = build_evidence(&pairs, &MODEL_NODES, &Vocabulary::default()).unwrap();
        assert_eq!(evidence.get(Field::Ca), Some("3"));
        assert_eq!(evidence.len(), 1);
    }

    #[test]
    fn test_build_rejects_empty_model_node_value() {
        assert_eq!(
            build_evidence(&[RawPair::new("Sex", " ")], &MODEL_NODES, &Vocabulary::default()),
            Err(EvidenceError::EmptyValue {
                key: "sex".to_string()
            })
        );
    }

    #[test]
    fn test_build_drops_empty_informational_value_and_empty_key() {
        let pairs = parse_message("sex=male, chol=, =female").unwrap();
        let evidence = build_evidence(&pairs, &MODEL_NODES, &Vocabulary::default()).unwrap();
        assert_eq!(evidence.iter().collect::<Vec<_>>(), vec![("sex", "Male")]);
    }

    #[test]
    fn test_strict_policy_ignores_informational_fields() {
        let strict = Vocabulary::new(AliasPolicy::Strict);
        let pairs = parse_message("chol=off-the-charts, ca=two").unwrap();
        let evidence = build_evidence(&pairs, &MODEL_NODES, &strict).unwrap();
        assert_eq!(evidence.iter().collect::<Vec<_>>(), vec![("ca", "2")]);
    }

    #[test]
    fn test_build_keeps_pass_through_token() {
        let evidence = EvidenceNormalizer::default().parse("cp=Sharp").unwrap();
        assert_eq!(evidence.get(Field::Cp), Some("sharp"));
    }

    #[test]
    fn test_strict_normalizer_rejects_unknown_alias() {
        let normalizer = EvidenceNormalizer::new(Vocabulary::new(AliasPolicy::Strict));
        assert!(matches!(
            normalizer.parse("sex=male, cp=sharp"),
            Err(EvidenceError::UnknownAlias { .. })
        ));
    }

    #[test]
    fn test_custom_model_nodes() {
        let normalizer = EvidenceNormalizer::default().with_model_nodes(vec![Field::Sex]);
        let evidence = normalizer.parse("sex=male, age=young").unwrap();
        assert_eq!(evidence.fields().collect::<Vec<_>>(), vec![Field::Sex]);
    }

    #[test]
    fn test_evidence_map_serializes_by_node_name() {
        let evidence = EvidenceNormalizer::default().parse("ca=zero, sex=male").unwrap();
        let json = serde_json::to_value(&evidence).unwrap();
        assert_eq!(json, serde_json::json!({"sex": "Male", "ca": "0"}));
    }
}
