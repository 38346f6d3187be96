use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::EvidenceError;
use crate::evidence::{EvidenceMap, RawPair};
use crate::pipeline::{AssessmentId, RiskPipeline};
use crate::risk::RiskAssessment;
use crate::vocabulary::Field;

/// One form submission. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    /// Raw `sex` value.
    pub sex: String,
    /// Raw `age` value.
    pub age: String,
    /// Raw `cp` value.
    pub cp: String,
    /// Raw `trestbps` value.
    pub trestbps: String,
    /// Raw `chol` value.
    pub chol: String,
    /// Raw `fbs` value.
    pub fbs: String,
    /// Raw `restecg` value.
    pub restecg: String,
    /// Raw `thalach` value.
    pub thalach: String,
    /// Raw `exang` value.
    pub exang: String,
    /// Raw `oldpeak` value.
    pub oldpeak: String,
    /// Raw `slope` value.
    pub slope: String,
    /// Raw `ca` value.
    pub ca: String,
    /// Raw `thal` value.
    pub thal: String,
}

impl FormSubmission {
    /// Builds a submission from named values, e.g. decoded form data.
    ///
    /// Names are matched case-insensitively; unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError::MissingFormField` for the first absent field.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, EvidenceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut values: BTreeMap<Field, String> = BTreeMap::new();
        for (name, value) in pairs {
            if let Some(field) = Field::from_name(name) {
                values.insert(field, value.to_string());
            }
        }

        let mut take = |field: Field| {
            values
                .remove(&field)
                .ok_or_else(|| EvidenceError::MissingFormField {
                    field: field.name().to_string(),
                })
        };

        Ok(Self {
            sex: take(Field::Sex)?,
            age: take(Field::Age)?,
            cp: take(Field::Cp)?,
            trestbps: take(Field::Trestbps)?,
            chol: take(Field::Chol)?,
            fbs: take(Field::Fbs)?,
            restecg: take(Field::Restecg)?,
            thalach: take(Field::Thalach)?,
            exang: take(Field::Exang)?,
            oldpeak: take(Field::Oldpeak)?,
            slope: take(Field::Slope)?,
            ca: take(Field::Ca)?,
            thal: take(Field::Thal)?,
        })
    }

    /// Raw value of `field`.
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Sex => &self.sex,
            Field::Age => &self.age,
            Field::Cp => &self.cp,
            Field::Trestbps => &self.trestbps,
            Field::Chol => &self.chol,
            Field::Fbs => &self.fbs,
            Field::Restecg => &self.restecg,
            Field::Thalach => &self.thalach,
            Field::Exang => &self.exang,
            Field::Oldpeak => &self.oldpeak,
            Field::Slope => &self.slope,
            Field::Ca => &self.ca,
            Field::Thal => &self.thal,
        }
    }

    /// All thirteen fields as raw pairs, in form order.
    #[must_use]
    pub fn pairs(&self) -> Vec<RawPair> {
        Field::ALL
            .iter()
            .map(|&field| RawPair::new(field.name(), self.value(field)))
            .collect()
    }
}

/// Everything the form page needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormReport {
    /// Percentage per target state in network order; `None` before
    /// submission or on error. Serialized as a JSON object.
    #[serde(serialize_with = "serialize_ordered")]
    pub result: Option<Vec<(String, String)>>,

    /// Evidence submitted to inference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceMap>,

    /// Risk tier payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<RiskAssessment>,

    /// The submission as entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_data: Option<FormSubmission>,

    /// User-visible failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Correlation ID of the assessment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_id: Option<AssessmentId>,

    /// Educational description per field.
    pub field_descriptions: BTreeMap<String, String>,
}

fn serialize_ordered<S>(
    result: &Option<Vec<(String, String)>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match result {
        Some(entries) => serializer.collect_map(entries.iter().map(|(k, v)| (k, v))),
        None => serializer.serialize_none(),
    }
}

impl FormReport {
    /// Percentage shown for `state`, if the submission succeeded.
    #[must_use]
    pub fn percentage(&self, state: &str) -> Option<&str> {
        self.result
            .as_ref()?
            .iter()
            .find(|(s, _)| s == state)
            .map(|(_, pct)| pct.as_str())
    }

    /// The report for an empty form.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            result: None,
            evidence: None,
            interpretation: None,
            form_data: None,
            error: None,
            assessment_id: None,
            field_descriptions: Field::ALL
                .iter()
                .map(|f| (f.name().to_string(), f.description().to_string()))
                .collect(),
        }
    }

    /// A report carrying only an error message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::blank()
        }
    }
}

/// Form adapter: one submission in, one report out.
#[derive(Debug, Clone)]
pub struct FormFrontend {
    pipeline: Arc<RiskPipeline>,
}

impl FormFrontend {
    /// Creates an adapter over a shared pipeline.
    #[must_use]
    pub fn new(pipeline: Arc<RiskPipeline>) -> Self {
        Self { pipeline }
    }

    /// Assesses a submission. Failures are reported in `error`, never raised.
    #[must_use]
    pub fn submit(&self, form: &FormSubmission) -> FormReport {
        match self.pipeline.assess(&form.pairs()) {
            Ok(assessment) => FormReport {
                result: Some(assessment.probabilities.clone()),
                interpretation: Some(assessment.interpretation()),
                assessment_id: Some(assessment.id),
                evidence: Some(assessment.evidence),
                form_data: Some(form.clone()),
                ..FormReport::blank()
            },
            Err(err) => {
                tracing::warn!(error = %err, "form submission failed");
                FormReport::failed(err.to_string())
            }
        }
    }
}
