//! Shared fixtures for mmo-gates integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mmo_gates::{Param, Recommendation, Report};

pub fn policies_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../ontology/policies")
}

pub fn default_policy_path() -> PathBuf {
    policies_dir().join("gates.yaml")
}

pub fn default_profiles_path() -> PathBuf {
    policies_dir().join("authority_profiles.yaml")
}

pub fn gain(recommendation_id: &str, db: f64) -> Recommendation {
    Recommendation::new(recommendation_id, "ACTION.UTILITY.GAIN")
        .with_risk("low")
        .with_param(Param::new("PARAM.GAIN.DB", db).with_unit("UNIT.DB"))
}

pub fn polarity_invert() -> Recommendation {
    Recommendation::new("REC.POLARITY.INVERT", "ACTION.UTILITY.POLARITY_INVERT")
        .with_risk("medium")
        .requiring_approval()
}

pub fn diagnostic() -> Recommendation {
    Recommendation::new("REC.DIAGNOSTIC.CHECK_POLARITY.001", "ACTION.DIAGNOSTIC.CHECK_POLARITY")
        .with_risk("low")
}

pub fn eq_with_bands(recommendation_id: &str, bands: usize) -> Recommendation {
    (0..bands).fold(
        Recommendation::new(recommendation_id, "ACTION.EQ.PARAMETRIC").with_risk("low"),
        |rec, i| rec.with_param(Param::new(format!("PARAM.EQ.BAND.{i}.GAIN_DB"), -1.0)),
    )
}

/// The three-recommendation report used throughout the gate tests.
pub fn scenario_report() -> Report {
    Report::new(vec![
        gain("REC.GAIN.SMALL", -2.0),
        gain("REC.GAIN.LARGE", -8.0),
        polarity_invert(),
    ])
}

/// `(context, outcome, reason_id)` triples of a recommendation's results.
pub fn triples(rec: &Recommendation) -> Vec<(String, String, String)> {
    rec.gate_results
        .iter()
        .map(|r| {
            (
                r.context.as_str().to_string(),
                r.outcome.as_str().to_string(),
                r.reason_id.clone(),
            )
        })
        .collect()
}

pub fn triple(context: &str, outcome: &str, reason_id: &str) -> (String, String, String) {
    (context.to_string(), outcome.to_string(), reason_id.to_string())
}
