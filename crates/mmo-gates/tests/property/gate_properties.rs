use std::collections::BTreeSet;

use mmo_gates::eligibility::is_canonically_ordered;
use mmo_gates::policy::parse_gate_policy;
use mmo_gates::{
    Context, Eligibility, GateEngine, GateEvaluator, GatePolicy, Param, ProfileOverlay, Recommendation,
    Report,
};
use proptest::prelude::*;

const POLICY: &str = r#"
schema_version: "0.1.0"
gates:
  - gate_id: GATE.GAIN_ABS_MAX
    applies_to: { action_id: ACTION.UTILITY.GAIN }
    contexts: [auto_apply]
    rule: { type: abs_max, param_id: PARAM.GAIN.DB, limit: 3.0 }
    reason_id: GAIN_TOO_LARGE
  - gate_id: GATE.GAIN_RENDER
    applies_to: { action_prefix: ACTION.UTILITY. }
    contexts: [suggest, render]
    rule: { type: abs_max, param_id: PARAM.GAIN.DB, limit: 9.0 }
    reason_id: GAIN_OUT_OF_RANGE
  - gate_id: GATE.EQ_BAND_COUNT
    applies_to: { action_prefix: ACTION.EQ. }
    contexts: [auto_apply, render]
    rule: { type: count_max, param_prefix: PARAM.EQ.BAND., limit: 3 }
    reason_id: EQ_TOO_MANY_BANDS
  - gate_id: GATE.REQUIRES_APPROVAL
    applies_to: { action_prefix: "" }
    contexts: [suggest, auto_apply, render]
    rule: { type: approval_required }
    reason_id: APPROVAL_REQUIRED
  - gate_id: GATE.DIAGNOSTIC_SUGGEST_ONLY
    applies_to: { action_prefix: ACTION.DIAGNOSTIC. }
    contexts: [auto_apply, render]
    rule: { type: action_prefix_block }
    reason_id: DIAGNOSTIC_SUGGEST_ONLY
"#;

fn policy() -> GatePolicy {
    parse_gate_policy(POLICY, false, "properties.yaml").unwrap()
}

fn arb_recommendation() -> impl Strategy<Value = Recommendation> {
    (
        prop::sample::select(vec![
            "ACTION.UTILITY.GAIN",
            "ACTION.UTILITY.POLARITY_INVERT",
            "ACTION.EQ.PARAMETRIC",
            "ACTION.DIAGNOSTIC.CHECK_POLARITY",
            "ACTION.SPACE.REVERB_SEND",
        ]),
        -20.0f64..20.0,
        0usize..8,
        any::<bool>(),
        0u32..1000,
    )
        .prop_map(|(action_id, gain_db, bands, requires_approval, n)| {
            let mut rec = Recommendation::new(format!("REC.{n:04}"), action_id)
                .with_param(Param::new("PARAM.GAIN.DB", gain_db));
            for i in 0..bands {
                rec = rec.with_param(Param::new(format!("PARAM.EQ.BAND.{i}.FREQ_HZ"), 1000.0));
            }
            rec.requires_approval = requires_approval;
            rec
        })
}

proptest! {
    #[test]
    fn results_are_canonically_ordered(recs in prop::collection::vec(arb_recommendation(), 0..20)) {
        let engine = GateEngine::new(policy(), ProfileOverlay::noop());
        let mut report = Report::new(recs);
        engine.annotate_report(&mut report);
        for rec in &report.recommendations {
            prop_assert!(is_canonically_ordered(&rec.gate_results));
        }
    }

    #[test]
    fn flags_follow_results(recs in prop::collection::vec(arb_recommendation(), 0..20)) {
        let engine = GateEngine::new(policy(), ProfileOverlay::noop());
        let mut report = Report::new(recs);
        engine.annotate_report(&mut report);
        for rec in &report.recommendations {
            let expected = Eligibility::from_records(&rec.gate_results);
            prop_assert_eq!(rec.eligible_auto_apply, Some(expected.auto_apply));
            prop_assert_eq!(rec.eligible_render, Some(expected.render));
        }
    }

    #[test]
    fn annotation_is_idempotent(recs in prop::collection::vec(arb_recommendation(), 0..20)) {
        let engine = GateEngine::new(policy(), ProfileOverlay::noop());
        let mut report = Report::new(recs);
        engine.annotate_report(&mut report);
        let first = report.to_canonical_json().unwrap();
        engine.annotate_report(&mut report);
        prop_assert_eq!(first, report.to_canonical_json().unwrap());
    }

    #[test]
    fn abs_max_rejects_iff_over_limit(value in -10.0f64..10.0) {
        let policy = policy();
        let overlay = ProfileOverlay::noop();
        let approvals = BTreeSet::new();
        let evaluator = GateEvaluator::new(&policy, &overlay, &approvals);
        let rec = Recommendation::new("REC.GAIN", "ACTION.UTILITY.GAIN")
            .with_param(Param::new("PARAM.GAIN.DB", value));
        let fired = evaluator
            .evaluate_context(&rec, Context::AutoApply)
            .iter()
            .any(|r| r.gate_id == "GATE.GAIN_ABS_MAX");
        prop_assert_eq!(fired, value.abs() > 3.0);
    }

    #[test]
    fn count_max_fires_iff_over_limit(bands in 0usize..10) {
        let policy = policy();
        let overlay = ProfileOverlay::noop();
        let approvals = BTreeSet::new();
        let evaluator = GateEvaluator::new(&policy, &overlay, &approvals);
        let rec = (0..bands).fold(Recommendation::new("REC.EQ", "ACTION.EQ.PARAMETRIC"), |rec, i| {
            rec.with_param(Param::new(format!("PARAM.EQ.BAND.{i}.GAIN_DB"), 1.0))
        });
        let results = evaluator.evaluate(&rec);
        prop_assert_eq!(!results.is_empty(), bands > 3);
    }

    #[test]
    fn approval_blocks_both_contexts(rec in arb_recommendation()) {
        let engine = GateEngine::new(policy(), ProfileOverlay::noop());
        let mut report = Report::new(vec![rec.clone()]);
        engine.annotate_report(&mut report);
        let annotated = &report.recommendations[0];
        if rec.requires_approval {
            prop_assert_eq!(annotated.eligible_auto_apply, Some(false));
            prop_assert_eq!(annotated.eligible_render, Some(false));
        }
        // Approval gates never produce suggest entries.
        prop_assert!(!annotated
            .gate_results
            .iter()
            .any(|r| r.context == Context::Suggest && r.reason_id == "APPROVAL_REQUIRED"));
    }

    #[test]
    fn parallel_matches_sequential(recs in prop::collection::vec(arb_recommendation(), 60..100)) {
        let parallel = GateEngine::new(policy(), ProfileOverlay::noop()).with_parallel(true);
        let sequential = GateEngine::new(policy(), ProfileOverlay::noop()).with_parallel(false);
        let mut a = Report::new(recs);
        let mut b = a.clone();
        parallel.annotate_report(&mut a);
        sequential.annotate_report(&mut b);
        prop_assert_eq!(a, b);
    }
}
