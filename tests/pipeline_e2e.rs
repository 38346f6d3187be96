use heartrisk::network::parse_model;
use heartrisk::{
    AliasPolicy, EvidenceMap, Field, InferenceEngine, RiskConfig, RiskPipeline, RiskTier,
    VariableElimination, MODEL_NODES,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

const MODEL: &str = include_str!("../models/heart_disease_model.json");

fn pipeline_with(config: &RiskConfig) -> RiskPipeline {
    let network = parse_model(MODEL.as_bytes()).unwrap();
    RiskPipeline::from_network(network, config)
}

fn pipeline() -> RiskPipeline {
    pipeline_with(&RiskConfig::default())
}

fn heart_disease(pipeline: &RiskPipeline, message: &str) -> f64 {
    let assessment = pipeline.assess_message(message).unwrap();
    assessment.posterior.probability("Heart-Disease").unwrap()
}

#[test]
fn mixed_case_message_is_normalized_and_assessed() {
    let pipeline = pipeline();
    let assessment = pipeline
        .assess_message("sex=male, age=middle-aged, cp=typical-angina, thalach=high, ca=two")
        .unwrap();

    let mut expected = EvidenceMap::new();
    expected.insert(Field::Sex, "Male");
    expected.insert(Field::Age, "Middle-Aged");
    expected.insert(Field::Cp, "Typical-Angina");
    expected.insert(Field::Thalach, "High");
    expected.insert(Field::Ca, "2");
    assert_eq!(assessment.evidence, expected);

    assert_eq!(
        assessment.probabilities,
        vec![
            ("No-Heart-Disease".to_string(), "57.14%".to_string()),
            ("Heart-Disease".to_string(), "42.86%".to_string()),
        ]
    );
    assert_eq!(assessment.tier, RiskTier::Moderate);
}

#[test]
fn number_words_map_to_vessel_counts() {
    let pipeline = pipeline();
    let assessment = pipeline.assess_message("ca=zero").unwrap();
    assert_eq!(assessment.evidence.get(Field::Ca), Some("0"));
    let p = assessment.posterior.probability("Heart-Disease").unwrap();
    assert!((p - 0.238_395).abs() < 1e-5, "got {p}");
    assert_eq!(assessment.tier, RiskTier::Low);
}

#[test]
fn empty_evidence_returns_prior() {
    let pipeline = pipeline();
    let assessment = pipeline.assess(&[]).unwrap();
    assert!(assessment.evidence.is_empty());
    let p = assessment.posterior.probability("Heart-Disease").unwrap();
    assert!((p - 0.431_44).abs() < 1e-5, "got {p}");
}

#[test]
fn root_evidence_reads_conditional_table() {
    let p = heart_disease(&pipeline(), "sex=female, age=young");
    assert!((p - 0.08).abs() < 1e-9, "got {p}");
}

#[test]
fn high_risk_profile() {
    let pipeline = pipeline();
    let assessment = pipeline
        .assess_message(
            "sex=Male, age=VERY-SENIOR, cp=asymptomatic, exang=yes, thal=reversible-defect, ca=3",
        )
        .unwrap();
    let p = assessment.posterior.probability("Heart-Disease").unwrap();
    assert!((p - 0.997_992).abs() < 1e-5, "got {p}");
    assert_eq!(assessment.tier, RiskTier::High);
    assert_eq!(assessment.interpretation().color, "#FF3B30");
}

#[test]
fn non_model_fields_are_dropped() {
    let pipeline = pipeline();
    let with_extras = pipeline
        .assess_message("chol=high, fbs=true, restecg=normal, oldpeak=low, ca=0")
        .unwrap();
    assert_eq!(with_extras.evidence.len(), 1);
    assert_eq!(with_extras.evidence.get(Field::Ca), Some("0"));

    let plain = pipeline.assess_message("ca=0").unwrap();
    assert_eq!(with_extras.probabilities, plain.probabilities);
}

#[test]
fn unknown_fields_are_ignored() {
    let pipeline = pipeline();
    let assessment = pipeline.assess_message("color=blue, sex=female").unwrap();
    assert_eq!(assessment.evidence.len(), 1);
}

#[test]
fn blank_informational_pairs_do_not_abort() {
    let pipeline = pipeline();
    let assessment = pipeline.assess_message("sex=male, chol=, =female").unwrap();

    let mut expected = EvidenceMap::new();
    expected.insert(Field::Sex, "Male");
    assert_eq!(assessment.evidence, expected);
    assert_eq!(assessment.probabilities.len(), 2);
}

#[test]
fn last_duplicate_wins() {
    let pipeline = pipeline();
    let assessment = pipeline.assess_message("sex=male, sex=female").unwrap();
    assert_eq!(assessment.evidence.get(Field::Sex), Some("Female"));
}

#[test]
fn missing_separator_aborts_whole_message() {
    let err = pipeline()
        .assess_message("sex=male, hello, ca=0")
        .unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("hello"));
}

#[test]
fn unrecognized_token_surfaces_as_inference_error() {
    let err = pipeline().assess_message("cp=sharp").unwrap_err();
    assert!(err.is_inference());
    let message = err.to_string();
    assert!(message.contains("sharp"));
    assert!(message.contains("Typical-Angina"));
}

#[test]
fn strict_policy_rejects_unrecognized_token_before_inference() {
    let config = RiskConfig {
        alias_policy: AliasPolicy::Strict,
        ..RiskConfig::default()
    };
    let err = pipeline_with(&config).assess_message("cp=sharp").unwrap_err();
    assert!(err.is_format());
}

#[test]
fn posterior_sums_to_one() {
    let pipeline = pipeline();
    for message in [
        "sex=male",
        "age=senior, trestbps=high",
        "thalach=low, age=young",
        "slope=up, exang=no, thal=fixed-defect",
        "ca=one, cp=atypical-angina, sex=female, age=very-senior",
    ] {
        let assessment = pipeline.assess_message(message).unwrap();
        let total = assessment.posterior.total();
        assert!((total - 1.0).abs() < 1e-4, "{message}: {total}");
    }
}

#[test]
fn every_alias_of_a_model_node_is_a_network_state() {
    let network = parse_model(MODEL.as_bytes()).unwrap();
    let engine = VariableElimination::new(network);
    for field in MODEL_NODES {
        let states = engine.states(field.name()).unwrap();
        for alias in field.aliases() {
            let (_, state) = heartrisk::canonicalize(field.name(), &alias);
            assert!(
                states.contains(&state),
                "{field}={alias} resolved to '{state}', not in {states:?}"
            );
        }
    }
}

#[test]
fn shared_pipeline_serves_concurrent_requests() {
    let pipeline = Arc::new(pipeline());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                let message = if i % 2 == 0 { "ca=0" } else { "ca=3, exang=yes" };
                pipeline.assess_message(message).unwrap().tier
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let tier = handle.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(tier, RiskTier::Low);
        } else {
            assert_eq!(tier, RiskTier::High);
        }
    }
}

#[test]
fn model_info_describes_network() {
    let pipeline = pipeline();
    let info = pipeline.model_info().unwrap();
    assert_eq!(info.model_nodes.len(), 10);
    assert!(info
        .model_edges
        .contains(&("target".to_string(), "ca".to_string())));
    assert!(info
        .model_edges
        .contains(&("age".to_string(), "target".to_string())));
    assert_eq!(info.nodes_info["ca"].states, vec!["0", "1", "2", "3"]);
    assert!(info.nodes_info["thal"].description.contains("Thalassemia"));
    assert_eq!(info.fingerprint.as_deref().map(str::len), Some(64));
}
