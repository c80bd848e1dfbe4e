//! Per-recommendation gate evaluation against the default and ad-hoc policies.

mod common;

use std::collections::BTreeSet;

use common::{triple, triples};
use mmo_core::constants::PROFILE_GATE_ID;
use mmo_gates::policy::parse_gate_policy;
use mmo_gates::{
    Context, GateDetails, GateEngine, GateEvaluator, GateOutcome, GatePolicy, Param, ProfileOverlay,
    Recommendation, Report,
};

fn default_engine() -> GateEngine {
    GateEngine::load(&common::default_policy_path(), None, None).unwrap()
}

fn engine_with_profile(profile_id: &str) -> GateEngine {
    GateEngine::load(
        &common::default_policy_path(),
        Some(profile_id),
        Some(common::default_profiles_path().as_path()),
    )
    .unwrap()
}

fn policy(yaml: &str) -> GatePolicy {
    parse_gate_policy(yaml, false, "inline.yaml").unwrap()
}

/// Annotate a single recommendation and hand it back.
fn annotate(engine: &GateEngine, rec: Recommendation) -> Recommendation {
    let mut report = Report::new(vec![rec]);
    engine.annotate_report(&mut report);
    report.recommendations.remove(0)
}

#[test]
fn test_default_policy_scenario() {
    let engine = default_engine();
    let mut report = common::scenario_report();
    engine.annotate_report(&mut report);
    let recs = &report.recommendations;

    let small = &recs[0];
    assert_eq!(small.recommendation_id, "REC.GAIN.SMALL");
    assert!(small.gate_results.is_empty());
    assert_eq!(small.eligible_auto_apply, Some(true));
    assert_eq!(small.eligible_render, Some(true));

    let large = &recs[1];
    assert_eq!(triples(large), vec![triple("auto_apply", "reject", "GAIN_TOO_LARGE")]);
    assert_eq!(large.eligible_auto_apply, Some(false));
    assert_eq!(large.eligible_render, Some(true));

    let polarity = &recs[2];
    assert_eq!(
        triples(polarity),
        vec![
            triple("auto_apply", "reject", "APPROVAL_REQUIRED"),
            triple("render", "reject", "APPROVAL_REQUIRED"),
        ]
    );
    assert_eq!(polarity.eligible_auto_apply, Some(false));
    assert_eq!(polarity.eligible_render, Some(false));
}

#[test]
fn test_gain_result_details() {
    let rec = annotate(&default_engine(), common::gain("REC.GAIN.LARGE", -8.0));
    let result = &rec.gate_results[0];
    assert_eq!(result.gate_id, "GATE.GAIN_ABS_MAX");
    assert_eq!(result.details["param_id"], "PARAM.GAIN.DB");
    assert_eq!(result.details["value"], -8.0);
    assert_eq!(result.details["abs_value"], 8.0);
    assert_eq!(result.details["limit"], 3.0);
    assert_eq!(result.details["limit_kind"], "auto_apply_abs_max");
}

#[test]
fn test_diagnostic_actions_are_suggest_only() {
    let rec = annotate(&default_engine(), common::diagnostic());
    assert_eq!(
        triples(&rec),
        vec![
            triple("auto_apply", "reject", "DIAGNOSTIC_SUGGEST_ONLY"),
            triple("render", "reject", "DIAGNOSTIC_SUGGEST_ONLY"),
        ]
    );
    assert_eq!(rec.eligible_auto_apply, Some(false));
    assert_eq!(rec.eligible_render, Some(false));
}

#[test]
fn test_abs_max_boundary_passes() {
    let engine = default_engine();
    let at_limit = annotate(&engine, common::gain("REC.GAIN.EDGE", 3.0));
    assert!(at_limit.gate_results.is_empty());
    let negative_at_limit = annotate(&engine, common::gain("REC.GAIN.EDGE", -3.0));
    assert!(negative_at_limit.gate_results.is_empty());
    let over = annotate(&engine, common::gain("REC.GAIN.OVER", 3.001));
    assert_eq!(triples(&over), vec![triple("auto_apply", "reject", "GAIN_TOO_LARGE")]);
}

#[test]
fn test_render_limit_is_separate() {
    let rec = annotate(&default_engine(), common::gain("REC.GAIN.HUGE", 15.0));
    assert_eq!(
        triples(&rec),
        vec![
            triple("auto_apply", "reject", "GAIN_TOO_LARGE"),
            triple("render", "reject", "GAIN_OUT_OF_RANGE"),
        ]
    );
    assert_eq!(rec.eligible_render, Some(false));
}

#[test]
fn test_numeric_string_values_are_coerced() {
    let rec = Recommendation::new("REC.GAIN.TEXT", "ACTION.UTILITY.GAIN")
        .with_param(Param::new("PARAM.GAIN.DB", "-8.0"));
    let rec = annotate(&default_engine(), rec);
    assert_eq!(rec.eligible_auto_apply, Some(false));
}

#[test]
fn test_missing_param_does_not_fire() {
    let rec = Recommendation::new("REC.GAIN.EMPTY", "ACTION.UTILITY.GAIN")
        .with_param(Param::new("PARAM.GAIN.DB", "unity"));
    let rec = annotate(&default_engine(), rec);
    assert!(rec.gate_results.is_empty());
    assert_eq!(rec.eligible_auto_apply, Some(true));
}

#[test]
fn test_count_max_demotes_to_suggest_only() {
    let engine = default_engine();
    let three = annotate(&engine, common::eq_with_bands("REC.EQ.THREE", 3));
    assert!(three.gate_results.is_empty());

    let four = annotate(&engine, common::eq_with_bands("REC.EQ.FOUR", 4));
    assert_eq!(
        triples(&four),
        vec![triple("auto_apply", "suggest_only", "EQ_TOO_MANY_BANDS")]
    );
    assert_eq!(four.gate_results[0].details["value"], 4);
    assert_eq!(four.eligible_auto_apply, Some(false));
    assert_eq!(four.eligible_render, Some(true));
}

#[test]
fn test_metric_delta_records_suggest_audit_entry() {
    let rec = Recommendation::new("REC.DOWNMIX.QA", "ACTION.DOWNMIX.RENDER")
        .with_param(Param::new("PARAM.DOWNMIX.QA.LOUDNESS_DELTA_LU", 2.0));
    let rec = annotate(&default_engine(), rec);
    assert_eq!(
        triples(&rec),
        vec![
            triple("suggest", "suggest_only", "DOWNMIX_QA_DELTA_TOO_LARGE"),
            triple("auto_apply", "suggest_only", "DOWNMIX_QA_DELTA_TOO_LARGE"),
        ]
    );
    assert_eq!(rec.eligible_auto_apply, Some(false));
    assert_eq!(rec.eligible_render, Some(true));
}

#[test]
fn test_approved_recommendation_passes_approval_gate() {
    let engine = default_engine().with_approvals(["REC.POLARITY.INVERT".to_string()]);
    let rec = annotate(&engine, common::polarity_invert());
    assert!(rec.gate_results.is_empty());
    assert_eq!(rec.eligible_auto_apply, Some(true));
    assert_eq!(rec.eligible_render, Some(true));
}

#[test]
fn test_approval_required_never_fires_in_suggest() {
    let policy = policy(
        r#"
schema_version: "0.1.0"
gates:
  - gate_id: GATE.REQUIRES_APPROVAL
    applies_to: { action_prefix: "" }
    contexts: [suggest, render]
    rule: { type: approval_required }
    reason_id: APPROVAL_REQUIRED
"#,
    );
    let overlay = ProfileOverlay::noop();
    let approvals = BTreeSet::new();
    let evaluator = GateEvaluator::new(&policy, &overlay, &approvals);
    let results = evaluator.evaluate(&common::polarity_invert());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].context, Context::Render);
}

#[test]
fn test_signed_abs_max() {
    let policy = policy(
        r#"
schema_version: "0.1.0"
gates:
  - gate_id: GATE.GAIN_BOOST_MAX
    applies_to: { action_id: ACTION.UTILITY.GAIN }
    contexts: [auto_apply]
    rule: { type: abs_max, param_id: PARAM.GAIN.DB, limit: 3.0, use_abs: false }
    reason_id: GAIN_BOOST_TOO_LARGE
"#,
    );
    let overlay = ProfileOverlay::noop();
    let approvals = BTreeSet::new();
    let evaluator = GateEvaluator::new(&policy, &overlay, &approvals);

    assert!(evaluator.evaluate(&common::gain("REC.CUT", -8.0)).is_empty());
    let boost = evaluator.evaluate(&common::gain("REC.BOOST", 8.0));
    assert_eq!(boost.len(), 1);
    match &boost[0].details {
        GateDetails::ParamLimit { limit_kind, use_abs, .. } => {
            assert_eq!(limit_kind, "auto_apply_max");
            assert!(!use_abs);
        }
        other => panic!("unexpected details {other:?}"),
    }
}

#[test]
fn test_disabled_gate_is_skipped() {
    let policy = policy(
        r#"
schema_version: "0.1.0"
gates:
  - gate_id: GATE.GAIN_ABS_MAX
    applies_to: { action_id: ACTION.UTILITY.GAIN }
    contexts: [auto_apply, render]
    rule: { type: abs_max, param_id: PARAM.GAIN.DB, limit: 3.0 }
    reason_id: GAIN_TOO_LARGE
    enabled: false
"#,
    );
    let overlay = ProfileOverlay::noop();
    let approvals = BTreeSet::new();
    let evaluator = GateEvaluator::new(&policy, &overlay, &approvals);
    assert!(evaluator.evaluate(&common::gain("REC.GAIN.LARGE", -8.0)).is_empty());
}

#[test]
fn test_guide_profile_disables_auto_apply() {
    let engine = engine_with_profile("PROFILE.GUIDE");
    let mut report = common::scenario_report();
    engine.annotate_report(&mut report);

    for rec in &report.recommendations {
        assert_eq!(rec.eligible_auto_apply, Some(false), "{}", rec.recommendation_id);
        let auto: Vec<_> = rec
            .gate_results
            .iter()
            .filter(|r| r.context == Context::AutoApply)
            .collect();
        assert_eq!(auto.len(), 1, "exactly one synthetic result per recommendation");
        assert_eq!(auto[0].gate_id, PROFILE_GATE_ID);
        assert_eq!(auto[0].outcome, GateOutcome::Reject);
        assert_eq!(auto[0].reason_id, "PROFILE_AUTO_APPLY_DISABLED");
        assert_eq!(auto[0].details["profile_id"], "PROFILE.GUIDE");
    }

    // Render is untouched by the profile.
    let recs = &report.recommendations;
    assert_eq!(recs[0].eligible_render, Some(true));
    assert_eq!(recs[1].eligible_render, Some(true));
    assert_eq!(recs[2].eligible_render, Some(false));
}

#[test]
fn test_limit_override_changes_only_that_gate() {
    let base = default_engine();
    let full_send = engine_with_profile("PROFILE.FULL_SEND");

    let mut base_report = common::scenario_report();
    let mut full_report = common::scenario_report();
    base.annotate_report(&mut base_report);
    full_send.annotate_report(&mut full_report);

    // -8 dB is over the base auto-apply limit but inside the profile's.
    let large_base = &base_report.recommendations[1];
    let large_full = &full_report.recommendations[1];
    assert_eq!(large_base.recommendation_id, "REC.GAIN.LARGE");
    assert_eq!(large_base.eligible_auto_apply, Some(false));
    assert_eq!(large_full.eligible_auto_apply, Some(true));
    assert_eq!(large_full.eligible_render, Some(true));
    assert!(large_full.gate_results.is_empty());

    // Approval gating is not part of the override.
    let polarity_base = &base_report.recommendations[2];
    let polarity_full = &full_report.recommendations[2];
    assert_eq!(polarity_base.gate_results, polarity_full.gate_results);
    assert_eq!(polarity_full.eligible_auto_apply, Some(false));
    assert_eq!(polarity_full.eligible_render, Some(false));

    let huge = annotate(&full_send, common::gain("REC.GAIN.HUGE", -13.0));
    assert_eq!(huge.gate_results[0].gate_id, "GATE.GAIN_ABS_MAX");
    assert_eq!(huge.gate_results[0].details["limit"], 12.0);
    assert_eq!(huge.eligible_auto_apply, Some(false));

    // The base policy still carries its own limit.
    let gate = full_send.policy().get("GATE.GAIN_ABS_MAX").unwrap();
    assert_eq!(gate.rule.limit(), Some(3.0));
}

#[test]
fn test_per_gate_overrides() {
    let turbo = engine_with_profile("PROFILE.TURBO");

    let eq = annotate(&turbo, common::eq_with_bands("REC.EQ.MANY", 8));
    assert!(eq.gate_results.is_empty());

    let downmix = Recommendation::new("REC.DOWNMIX.QA", "ACTION.DOWNMIX.RENDER")
        .with_param(Param::new("PARAM.DOWNMIX.QA.LOUDNESS_DELTA_LU", 2.0));
    let downmix = annotate(&turbo, downmix);
    assert_eq!(
        triples(&downmix),
        vec![triple("suggest", "suggest_only", "DOWNMIX_QA_DELTA_TOO_LARGE")]
    );
    assert_eq!(downmix.eligible_auto_apply, Some(true));
}

#[test]
fn test_unmatched_action_passes() {
    let rec = Recommendation::new("REC.REVERB", "ACTION.SPACE.REVERB_SEND")
        .with_param(Param::new("PARAM.GAIN.DB", -30.0));
    let rec = annotate(&default_engine(), rec);
    assert!(rec.gate_results.is_empty());
}
