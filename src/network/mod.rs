//! Discrete Bayesian network.
//!
//! A network is a set of named variables with ordered states and one
//! conditional probability distribution (CPD) per variable. Networks are
//! validated once when built and are immutable afterwards, so a single
//! instance can be shared by every request.

mod elimination;
mod factor;
mod loader;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::vocabulary::describe;

pub use elimination::VariableElimination;
pub use loader::{load_model, parse_model};

/// Column sums may deviate from 1 by at most this much.
const CPD_TOLERANCE: f64 = 1e-6;

/// A variable as declared in a network file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Node name.
    pub name: String,
    /// Ordered state names.
    pub states: Vec<String>,
}

/// A CPD as declared in a network file.
///
/// `values[i][j]` is `P(variable = states[i] | parent combination j)`, with
/// parent combinations enumerated so that the last parent varies fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpdSpec {
    /// Child variable.
    pub variable: String,
    /// Parent variables, in column-enumeration order.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Probability table, one row per child state.
    pub values: Vec<Vec<f64>>,
}

/// Serialized form of a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable model name.
    #[serde(default)]
    pub name: String,
    /// Declared variables.
    pub variables: Vec<VariableSpec>,
    /// One CPD per variable.
    pub cpds: Vec<CpdSpec>,
}

#[derive(Debug, Clone)]
pub(crate) struct Cpd {
    pub(crate) parents: Vec<usize>,
    /// Row-major: child state slowest, then parents with the last fastest.
    pub(crate) values: Vec<f64>,
}

/// A validated, immutable discrete Bayesian network.
#[derive(Debug, Clone)]
pub struct DiscreteNetwork {
    name: String,
    variables: Vec<VariableSpec>,
    index: HashMap<String, usize>,
    cpds: Vec<Cpd>,
    fingerprint: Option<String>,
}

impl DiscreteNetwork {
    /// Validates a network specification.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if variables are duplicated or stateless, a CPD
    /// is missing, duplicated, misshapen or not normalized, or the parent
    /// graph has a cycle.
    pub fn from_spec(spec: NetworkSpec) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(spec.variables.len());
        for (i, var) in spec.variables.iter().enumerate() {
            if var.states.is_empty() {
                return Err(ModelError::NoStates {
                    variable: var.name.clone(),
                });
            }
            if index.insert(var.name.clone(), i).is_some() {
                return Err(ModelError::DuplicateVariable {
                    variable: var.name.clone(),
                });
            }
        }

        let lookup = |name: &str| {
            index.get(name).copied().ok_or_else(|| ModelError::UnknownVariable {
                variable: name.to_string(),
            })
        };

        let mut slots: Vec<Vec<Cpd>> = vec![Vec::new(); spec.variables.len()];
        for cpd in &spec.cpds {
            let child = lookup(cpd.variable.as_str())?;
            let parents = cpd
                .parents
                .iter()
                .map(|p| lookup(p.as_str()))
                .collect::<Result<Vec<_>, _>>()?;

            let expected_rows = spec.variables[child].states.len();
            let expected_columns: usize = parents
                .iter()
                .map(|&p| spec.variables[p].states.len())
                .product();
            let rows = cpd.values.len();
            let columns = cpd.values.first().map_or(0, Vec::len);
            if rows != expected_rows
                || cpd.values.iter().any(|row| row.len() != expected_columns)
            {
                return Err(ModelError::CpdShape {
                    variable: cpd.variable.clone(),
                    rows,
                    columns,
                    expected_rows,
                    expected_columns,
                });
            }

            if let Some(&value) = cpd
                .values
                .iter()
                .flatten()
                .find(|v| !v.is_finite() || **v < 0.0 || **v > 1.0)
            {
                return Err(ModelError::InvalidProbability {
                    variable: cpd.variable.clone(),
                    value,
                });
            }

            for column in 0..expected_columns {
                let sum: f64 = cpd.values.iter().map(|row| row[column]).sum();
                if (sum - 1.0).abs() > CPD_TOLERANCE {
                    return Err(ModelError::CpdNotNormalized {
                        variable: cpd.variable.clone(),
                        column,
                        sum,
                    });
                }
            }

            slots[child].push(Cpd {
                parents,
                values: cpd.values.iter().flatten().copied().collect(),
            });
        }

        let mut cpds = Vec::with_capacity(slots.len());
        for (i, mut slot) in slots.into_iter().enumerate() {
            if slot.len() != 1 {
                return Err(ModelError::CpdCount {
                    variable: spec.variables[i].name.clone(),
                    count: slot.len(),
                });
            }
            cpds.extend(slot.pop());
        }

        check_acyclic(&spec.variables, &cpds)?;

        Ok(Self {
            name: spec.name,
            variables: spec.variables,
            index,
            cpds,
            fingerprint: None,
        })
    }

    /// Attaches a content fingerprint (hex digest of the source bytes).
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content fingerprint, if loaded from a file.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Node names in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    /// `(parent, child)` edges.
    #[must_use]
    pub fn edges(&self) -> Vec<(String, String)> {
        self.cpds
            .iter()
            .enumerate()
            .flat_map(|(child, cpd)| {
                cpd.parents.iter().map(move |&p| {
                    (self.variables[p].name.clone(), self.variables[child].name.clone())
                })
            })
            .collect()
    }

    /// States of `variable`, if it exists.
    #[must_use]
    pub fn states(&self, variable: &str) -> Option<&[String]> {
        self.index
            .get(variable)
            .map(|&i| self.variables[i].states.as_slice())
    }

    /// Total number of CPD cells.
    #[must_use]
    pub fn total_parameters(&self) -> usize {
        self.cpds.iter().map(|c| c.values.len()).sum()
    }

    /// Describes the network for display.
    #[must_use]
    pub fn info(&self) -> ModelInfo {
        let nodes_info = self
            .variables
            .iter()
            .map(|v| {
                (
                    v.name.clone(),
                    NodeInfo {
                        states: v.states.clone(),
                        description: describe(&v.name).to_string(),
                    },
                )
            })
            .collect();

        ModelInfo {
            name: self.name.clone(),
            model_nodes: self.nodes().map(str::to_string).collect(),
            model_edges: self.edges(),
            nodes_info,
            total_parameters: self.total_parameters(),
            fingerprint: self.fingerprint.clone(),
        }
    }

    pub(crate) fn index_of(&self, variable: &str) -> Option<usize> {
        self.index.get(variable).copied()
    }

    pub(crate) fn cardinality(&self, variable: usize) -> usize {
        self.variables[variable].states.len()
    }

    pub(crate) fn variable(&self, variable: usize) -> &VariableSpec {
        &self.variables[variable]
    }

    pub(crate) fn cpds(&self) -> &[Cpd] {
        &self.cpds
    }

    pub(crate) fn len(&self) -> usize {
        self.variables.len()
    }
}

fn check_acyclic(variables: &[VariableSpec], cpds: &[Cpd]) -> Result<(), ModelError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Active,
        Done,
    }

    fn visit(node: usize, cpds: &[Cpd], marks: &mut [Mark]) -> Option<usize> {
        match marks[node] {
            Mark::Done => return None,
            Mark::Active => return Some(node),
            Mark::Unvisited => {}
        }
        marks[node] = Mark::Active;
        for &parent in &cpds[node].parents {
            if let Some(cycle) = visit(parent, cpds, marks) {
                return Some(cycle);
            }
        }
        marks[node] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; variables.len()];
    for node in 0..variables.len() {
        if let Some(cycle) = visit(node, cpds, &mut marks) {
            return Err(ModelError::Cycle {
                variable: variables[cycle].name.clone(),
            });
        }
    }
    Ok(())
}

/// States and description of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Ordered state names.
    pub states: Vec<String>,
    /// Educational description.
    pub description: String,
}

/// Structural summary of a loaded network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name.
    pub name: String,
    /// Node names in declaration order.
    pub model_nodes: Vec<String>,
    /// `(parent, child)` edges.
    pub model_edges: Vec<(String, String)>,
    /// Per-node states and descriptions.
    pub nodes_info: BTreeMap<String, NodeInfo>,
    /// Total number of CPD cells.
    pub total_parameters: usize,
    /// Content fingerprint of the model file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}
