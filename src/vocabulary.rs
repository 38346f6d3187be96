//! Field vocabulary: the closed set of clinical fields and the alias table
//! mapping loosely-typed user tokens onto the exact state names the network
//! was trained with.
//!
//! Canonical states are case- and punctuation-exact (`"Typical-Angina"`,
//! `"ST-T Abnormality"`). Aliases are matched after trimming and lowercasing,
//! and every canonical state is also an alias of itself so canonicalization
//! is idempotent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvidenceError;

/// A clinical or demographic field accepted from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Biological sex.
    Sex,
    /// Age band.
    Age,
    /// Chest pain type.
    Cp,
    /// Resting blood pressure band.
    Trestbps,
    /// Serum cholesterol band. Informational only.
    Chol,
    /// Fasting blood sugar above 120 mg/dl. Informational only.
    Fbs,
    /// Resting ECG result. Informational only.
    Restecg,
    /// Maximum heart rate band.
    Thalach,
    /// Exercise-induced angina.
    Exang,
    /// ST depression band. Informational only.
    Oldpeak,
    /// Slope of the peak exercise ST segment.
    Slope,
    /// Number of major vessels colored by fluoroscopy.
    Ca,
    /// Thalassemia test result.
    Thal,
}

/// Fields the network conditions its outcome on, in the order the network lists them.
pub const MODEL_NODES: [Field; 9] = [
    Field::Age,
    Field::Trestbps,
    Field::Cp,
    Field::Exang,
    Field::Thalach,
    Field::Thal,
    Field::Sex,
    Field::Ca,
    Field::Slope,
];

impl Field {
    /// Every field, in form order.
    pub const ALL: [Self; 13] = [
        Self::Sex,
        Self::Age,
        Self::Cp,
        Self::Trestbps,
        Self::Chol,
        Self::Fbs,
        Self::Restecg,
        Self::Thalach,
        Self::Exang,
        Self::Oldpeak,
        Self::Slope,
        Self::Ca,
        Self::Thal,
    ];

    /// The lowercase node name used by the network.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sex => "sex",
            Self::Age => "age",
            Self::Cp => "cp",
            Self::Trestbps => "trestbps",
            Self::Chol => "chol",
            Self::Fbs => "fbs",
            Self::Restecg => "restecg",
            Self::Thalach => "thalach",
            Self::Exang => "exang",
            Self::Oldpeak => "oldpeak",
            Self::Slope => "slope",
            Self::Ca => "ca",
            Self::Thal => "thal",
        }
    }

    /// Looks a field up by name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Returns true if the network conditions on this field.
    #[must_use]
    pub fn is_model_node(self) -> bool {
        MODEL_NODES.contains(&self)
    }

    /// Canonical states of this field, exactly as the network names them.
    #[must_use]
    pub const fn states(self) -> &'static [&'static str] {
        match self {
            Self::Sex => &["Male", "Female"],
            Self::Age => &["Young", "Middle-Aged", "Senior", "Very-Senior"],
            Self::Cp => &[
                "Typical-Angina",
                "Asymptomatic",
                "Atypical-Angina",
                "Non-Anginal-Pain",
            ],
            Self::Trestbps | Self::Chol => &["Low", "Normal", "High"],
            Self::Fbs => &["True", "False"],
            Self::Restecg => &[
                "Normal",
                "ST-T Abnormality",
                "Left Ventricular Hypertrophy",
            ],
            Self::Thalach | Self::Oldpeak => &["Low", "Medium", "High"],
            Self::Exang => &["Yes", "No"],
            Self::Slope => &["Upsloping", "Flat", "Downsloping"],
            Self::Ca => &["0", "1", "2", "3"],
            Self::Thal => &["Normal", "Fixed-Defect", "Reversable-Defect"],
        }
    }

    /// Synonyms accepted for this field beyond the lowercase canonical states.
    const fn synonyms(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Ca => &[("zero", "0"), ("one", "1"), ("two", "2"), ("three", "3")],
            Self::Slope => &[("up", "Upsloping"), ("down", "Downsloping")],
            Self::Thal => &[("reversible-defect", "Reversable-Defect")],
            Self::Restecg => &[
                ("stt-abnormality", "ST-T Abnormality"),
                ("lv-hypertrophy", "Left Ventricular Hypertrophy"),
            ],
            _ => &[],
        }
    }

    /// Resolves an already trimmed, lowercased token to a canonical state.
    #[must_use]
    pub fn lookup(self, token: &str) -> Option<&'static str> {
        self.synonyms()
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, state)| *state)
            .or_else(|| {
                self.states()
                    .iter()
                    .find(|state| state.to_lowercase() == token)
                    .copied()
            })
    }

    /// Every alias this field accepts, lowercase.
    #[must_use]
    pub fn aliases(self) -> Vec<String> {
        let mut aliases: Vec<String> = self.states().iter().map(|s| s.to_lowercase()).collect();
        aliases.extend(self.synonyms().iter().map(|(alias, _)| (*alias).to_string()));
        aliases
    }

    /// A short educational description of what the field measures.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Sex => "Biological sex affects heart disease risk patterns due to hormonal and physiological differences.",
            Self::Age => "Age is a primary risk factor - cardiovascular risk increases significantly with age.",
            Self::Cp => "Chest pain type is crucial for diagnosis. Asymptomatic cases often indicate silent heart disease.",
            Self::Trestbps => "Resting blood pressure above 140/90 mmHg indicates hypertension, a major risk factor.",
            Self::Chol => "Total cholesterol levels above 240 mg/dl significantly increase cardiovascular risk.",
            Self::Fbs => "Fasting blood sugar >120 mg/dl may indicate diabetes, doubling heart disease risk.",
            Self::Restecg => "ECG abnormalities can reveal underlying cardiac conditions even when asymptomatic.",
            Self::Thalach => "Maximum heart rate during exercise testing indicates cardiovascular fitness.",
            Self::Exang => "Exercise-induced chest pain suggests coronary artery disease and reduced blood flow.",
            Self::Oldpeak => "ST depression during exercise indicates ischemia and potential coronary blockage.",
            Self::Slope => "ST segment slope pattern provides insights into coronary artery health.",
            Self::Ca => "Number of major vessels with significant blockage detected via cardiac catheterization.",
            Self::Thal => "Thalassemia test results indicating blood flow patterns to the heart muscle.",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Description for an arbitrary node name, falling back for nodes outside the field set.
#[must_use]
pub fn describe(node: &str) -> &'static str {
    Field::from_name(node).map_or("No description available", Field::description)
}

/// Maps `(field, raw_token)` onto the network vocabulary.
///
/// Both parts are trimmed and lowercased. A known field with a known alias
/// resolves to its canonical state; anything else passes through as the
/// lowercased token.
#[must_use]
pub fn canonicalize(field: &str, raw_token: &str) -> (String, String) {
    let key = field.trim().to_lowercase();
    let token = raw_token.trim().to_lowercase();
    let resolved = Field::from_name(&key)
        .and_then(|f| f.lookup(&token))
        .map_or(token, str::to_string);
    (key, resolved)
}

/// What to do with a token that is not an alias of a known field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasPolicy {
    /// Forward the lowercased token and let inference reject it.
    #[default]
    PassThrough,

    /// Reject the token up front as a format error.
    Strict,
}

impl AliasPolicy {
    /// Returns a short stable identifier suitable for logging/debugging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for AliasPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass_through" | "pass-through" | "passthrough" => Ok(Self::PassThrough),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown alias policy '{other}'")),
        }
    }
}

/// The read-only vocabulary table, carrying the unknown-alias policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vocabulary {
    policy: AliasPolicy,
}

impl Vocabulary {
    /// Creates a vocabulary with the given unknown-alias policy.
    #[must_use]
    pub const fn new(policy: AliasPolicy) -> Self {
        Self { policy }
    }

    /// Returns the unknown-alias policy.
    #[must_use]
    pub const fn policy(&self) -> AliasPolicy {
        self.policy
    }

    /// Canonicalizes a pair, applying the unknown-alias policy.
    ///
    /// Under [`AliasPolicy::Strict`] a token that is not an alias of a known
    /// field is a format error. Unknown fields always pass through; they are
    /// filtered later against the model nodes.
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError::UnknownAlias` under the strict policy.
    pub fn resolve(&self, field: &str, raw_token: &str) -> Result<(String, String), EvidenceError> {
        let (key, value) = canonicalize(field, raw_token);
        if let Some(known) = Field::from_name(&key) {
            if known.lookup(&value.to_lowercase()).is_none() {
                if self.policy == AliasPolicy::Strict {
                    return Err(EvidenceError::UnknownAlias { field: key, token: value });
                }
                tracing::warn!(field = %key, token = %value, "unrecognized value passed through");
            }
        }
        Ok((key, value))
    }
}
