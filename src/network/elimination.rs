//! Exact marginal inference by variable elimination.

use crate::error::InferenceError;
use crate::evidence::EvidenceMap;
use crate::inference::{InferenceEngine, Posterior};
use crate::network::factor::Factor;
use crate::network::DiscreteNetwork;

/// Variable-elimination engine over a [`DiscreteNetwork`].
#[derive(Debug, Clone)]
pub struct VariableElimination {
    network: DiscreteNetwork,
}

impl VariableElimination {
    /// Wraps a validated network.
    #[must_use]
    pub fn new(network: DiscreteNetwork) -> Self {
        Self { network }
    }

    /// The underlying network.
    #[must_use]
    pub fn network(&self) -> &DiscreteNetwork {
        &self.network
    }

    fn resolve_evidence(
        &self,
        target: usize,
        evidence: &EvidenceMap,
    ) -> Result<Vec<(usize, usize)>, InferenceError> {
        evidence
            .iter()
            .map(|(name, state)| {
                let variable =
                    self.network
                        .index_of(name)
                        .ok_or_else(|| InferenceError::UnknownVariable {
                            variable: name.to_string(),
                        })?;
                if variable == target {
                    return Err(InferenceError::TargetObserved {
                        target: name.to_string(),
                    });
                }
                let states = &self.network.variable(variable).states;
                let index = states.iter().position(|s| s == state).ok_or_else(|| {
                    InferenceError::UnknownState {
                        variable: name.to_string(),
                        state: state.to_string(),
                        expected: states.clone(),
                    }
                })?;
                Ok((variable, index))
            })
            .collect()
    }

    fn initial_factors(&self, observed: &[(usize, usize)]) -> Vec<Factor> {
        self.network
            .cpds()
            .iter()
            .enumerate()
            .map(|(child, cpd)| {
                let mut scope = Vec::with_capacity(cpd.parents.len() + 1);
                scope.push(child);
                scope.extend_from_slice(&cpd.parents);
                let cards = scope.iter().map(|&v| self.network.cardinality(v)).collect();
                let factor = Factor::new(scope, cards, cpd.values.clone());
                observed
                    .iter()
                    .fold(factor, |f, &(var, state)| f.reduce(var, state))
            })
            .collect()
    }
}

/// Picks the hidden variable whose elimination creates the smallest factor.
fn next_variable(hidden: &[usize], factors: &[Factor]) -> Option<usize> {
    hidden.iter().copied().min_by_key(|&var| {
        let mut scope: Vec<usize> = factors
            .iter()
            .filter(|f| f.contains(var))
            .flat_map(|f| f.scope().iter().copied())
            .collect();
        scope.sort_unstable();
        scope.dedup();
        (scope.len(), var)
    })
}

impl InferenceEngine for VariableElimination {
    fn query(&self, target: &str, evidence: &EvidenceMap) -> Result<Posterior, InferenceError> {
        let target_index =
            self.network
                .index_of(target)
                .ok_or_else(|| InferenceError::UnknownVariable {
                    variable: target.to_string(),
                })?;
        let observed = self.resolve_evidence(target_index, evidence)?;

        let mut factors = self.initial_factors(&observed);
        let mut hidden: Vec<usize> = (0..self.network.len())
            .filter(|&v| v != target_index && !observed.iter().any(|&(o, _)| o == v))
            .collect();

        while let Some(var) = next_variable(&hidden, &factors) {
            hidden.retain(|&v| v != var);
            let (touching, rest): (Vec<Factor>, Vec<Factor>) =
                factors.into_iter().partition(|f| f.contains(var));
            factors = rest;
            let combined = touching
                .iter()
                .fold(Factor::unit(), |acc, f| acc.product(f));
            factors.push(combined.marginalize(var));
        }

        let joint = factors
            .iter()
            .fold(Factor::unit(), |acc, f| acc.product(f));
        let unnormalized = joint.values();

        let total: f64 = unnormalized.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(InferenceError::ImpossibleEvidence);
        }

        let states = &self.network.variable(target_index).states;
        let entries = states
            .iter()
            .cloned()
            .zip(unnormalized.iter().map(|v| v / total))
            .collect();
        Posterior::new(target, entries)
    }

    fn variables(&self) -> Vec<String> {
        self.network.nodes().map(str::to_string).collect()
    }

    fn states(&self, variable: &str) -> Option<Vec<String>> {
        self.network.states(variable).map(<[String]>::to_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::tests::rain_spec;
    use crate::network::{CpdSpec, NetworkSpec, VariableSpec};
    use crate::vocabulary::Field;

    fn rain_engine() -> VariableElimination {
        VariableElimination::new(DiscreteNetwork::from_spec(rain_spec()).unwrap())
    }

    #[test]
    fn test_prior_without_evidence() {
        let posterior = rain_engine().query("wet", &EvidenceMap::new()).unwrap();
        let wet = posterior.probability("yes").unwrap();
        // 0.2 * 0.9 + 0.8 * 0.1
        assert!((wet - 0.26).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_target() {
        assert_eq!(
            rain_engine().query("snow", &EvidenceMap::new()).unwrap_err(),
            InferenceError::UnknownVariable {
                variable: "snow".to_string()
            }
        );
    }

    /// Network whose node names are real fields so `EvidenceMap` can address them.
    fn sex_ca_engine(ca_given_female: [f64; 2]) -> VariableElimination {
        let spec = NetworkSpec {
            name: "sex-ca".to_string(),
            variables: vec![
                VariableSpec {
                    name: "sex".to_string(),
                    states: vec!["Male".to_string(), "Female".to_string()],
                },
                VariableSpec {
                    name: "ca".to_string(),
                    states: vec!["0".to_string(), "1".to_string()],
                },
                VariableSpec {
                    name: "target".to_string(),
                    states: vec!["No-Heart-Disease".to_string(), "Heart-Disease".to_string()],
                },
            ],
            cpds: vec![
                CpdSpec {
                    variable: "sex".to_string(),
                    parents: vec![],
                    values: vec![vec![0.5], vec![0.5]],
                },
                CpdSpec {
                    variable: "ca".to_string(),
                    parents: vec!["sex".to_string()],
                    values: vec![
                        vec![0.7, ca_given_female[0]],
                        vec![0.3, ca_given_female[1]],
                    ],
                },
                CpdSpec {
                    variable: "target".to_string(),
                    parents: vec!["sex".to_string(), "ca".to_string()],
                    values: vec![vec![0.9, 0.4, 0.8, 0.3], vec![0.1, 0.6, 0.2, 0.7]],
                },
            ],
        };
        VariableElimination::new(DiscreteNetwork::from_spec(spec).unwrap())
    }

    #[test]
    fn test_posterior_conditions_on_evidence() {
        let engine = sex_ca_engine([0.5, 0.5]);
        let mut evidence = EvidenceMap::new();
        evidence.insert(Field::Sex, "Female");
        let posterior = engine.query("target", &evidence).unwrap();
        // ca marginalized: 0.5 * 0.2 + 0.5 * 0.7
        assert!((posterior.probability("Heart-Disease").unwrap() - 0.45).abs() < 1e-9);
        assert!((posterior.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_state_lists_trained_states() {
        let engine = sex_ca_engine([0.5, 0.5]);
        let mut evidence = EvidenceMap::new();
        evidence.insert(Field::Ca, "seven");
        assert_eq!(
            engine.query("target", &evidence).unwrap_err(),
            InferenceError::UnknownState {
                variable: "ca".to_string(),
                state: "seven".to_string(),
                expected: vec!["0".to_string(), "1".to_string()],
            }
        );
    }

    #[test]
    fn test_impossible_evidence() {
        let engine = sex_ca_engine([1.0, 0.0]);
        let mut evidence = EvidenceMap::new();
        evidence.insert(Field::Sex, "Female");
        evidence.insert(Field::Ca, "1");
        assert_eq!(
            engine.query("target", &evidence).unwrap_err(),
            InferenceError::ImpossibleEvidence
        );
    }

    #[test]
    fn test_evidence_outside_network() {
        let engine = sex_ca_engine([0.5, 0.5]);
        let mut evidence = EvidenceMap::new();
        evidence.insert(Field::Thal, "Normal");
        assert!(matches!(
            engine.query("target", &evidence),
            Err(InferenceError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn test_target_given_as_evidence() {
        let engine = sex_ca_engine([0.5, 0.5]);
        let mut evidence = EvidenceMap::new();
        evidence.insert(Field::Sex, "Male");
        assert_eq!(
            engine.query("sex", &evidence).unwrap_err(),
            InferenceError::TargetObserved {
                target: "sex".to_string()
            }
        );
    }
}
