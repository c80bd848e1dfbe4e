//! Gate evaluator: per-context rule dispatch for one recommendation.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};
use tracing::trace;

use mmo_core::constants::PROFILE_GATE_ID;

use crate::eligibility::sort_results;
use crate::model::{GateResultRecord, Recommendation};
use crate::policy::{ActionMatcher, Context, GateDefinition, GateOutcome, GatePolicy, GateRule};
use crate::profile::ProfileOverlay;

/// Rule-specific evidence attached to a gate result.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDetails {
    ProfileDisabled {
        profile_id: String,
        context: Context,
    },
    ApprovalRequired,
    ActionBlocked {
        action_id: String,
        action_prefix: String,
    },
    ParamLimit {
        param_id: String,
        value: f64,
        limit: f64,
        use_abs: bool,
        limit_kind: String,
    },
    CountLimit {
        param_prefix: String,
        count: usize,
        limit: f64,
        limit_kind: String,
    },
    MetricDelta {
        param_id: String,
        value: f64,
        limit: f64,
        limit_kind: String,
    },
}

impl GateDetails {
    /// Convert to the loosely-typed map written into reports.
    pub fn to_map(&self) -> Map<String, Value> {
        let value = match self {
            Self::ProfileDisabled {
                profile_id,
                context,
            } => json!({ "profile_id": profile_id, "context": context.as_str() }),
            Self::ApprovalRequired => json!({ "requires_approval": true }),
            Self::ActionBlocked {
                action_id,
                action_prefix,
            } => json!({ "action_id": action_id, "action_prefix": action_prefix }),
            Self::ParamLimit {
                param_id,
                value,
                limit,
                use_abs,
                limit_kind,
            } => json!({
                "param_id": param_id,
                "value": value,
                "abs_value": value.abs(),
                "limit": limit,
                "limit_kind": limit_kind,
                "use_abs": use_abs,
            }),
            Self::CountLimit {
                param_prefix,
                count,
                limit,
                limit_kind,
            } => json!({
                "param_prefix": param_prefix,
                "value": count,
                "limit": limit,
                "limit_kind": limit_kind,
            }),
            Self::MetricDelta {
                param_id,
                value,
                limit,
                limit_kind,
            } => json!({
                "param_id": param_id,
                "value": value,
                "limit": limit,
                "limit_kind": limit_kind,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// One non-passing gate outcome for one context.
#[derive(Debug, Clone, PartialEq)]
pub struct GateResult {
    pub gate_id: String,
    pub context: Context,
    pub outcome: GateOutcome,
    pub reason_id: String,
    pub details: GateDetails,
}

impl GateResult {
    /// Total-order key: `(context_rank, gate_id, reason_id)`.
    pub fn sort_key(&self) -> (Context, &str, &str) {
        (self.context, self.gate_id.as_str(), self.reason_id.as_str())
    }

    pub fn to_record(&self) -> GateResultRecord {
        GateResultRecord {
            gate_id: self.gate_id.clone(),
            context: self.context,
            outcome: self.outcome,
            reason_id: self.reason_id.clone(),
            details: self.details.to_map(),
        }
    }
}

/// Borrowing evaluator over an immutable policy and overlay.
///
/// Holds no state of its own, so one evaluator can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct GateEvaluator<'a> {
    policy: &'a GatePolicy,
    overlay: &'a ProfileOverlay,
    approvals: &'a BTreeSet<String>,
}

impl<'a> GateEvaluator<'a> {
    pub fn new(
        policy: &'a GatePolicy,
        overlay: &'a ProfileOverlay,
        approvals: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            policy,
            overlay,
            approvals,
        }
    }

    /// Evaluate every context and return the sorted, non-passing results.
    pub fn evaluate(&self, rec: &Recommendation) -> Vec<GateResult> {
        let mut results = Vec::new();
        for &context in Context::all() {
            results.extend(self.evaluate_context(rec, context));
        }
        sort_results(&mut results);
        results
    }

    /// Evaluate one context. A profile-disabled context yields exactly one
    /// synthetic reject and skips the policy's gates.
    pub fn evaluate_context(&self, rec: &Recommendation, context: Context) -> Vec<GateResult> {
        if self.overlay.context_disabled(context) {
            let profile_id = self.overlay.profile_id().unwrap_or_default().to_string();
            trace!(
                recommendation_id = %rec.recommendation_id,
                %context,
                %profile_id,
                "context disabled by profile"
            );
            return vec![GateResult {
                gate_id: PROFILE_GATE_ID.to_string(),
                context,
                outcome: GateOutcome::Reject,
                reason_id: context.profile_disabled_reason_id(),
                details: GateDetails::ProfileDisabled {
                    profile_id,
                    context,
                },
            }];
        }

        let mut results = Vec::new();
        for gate in self.policy.gates() {
            if !gate.applies_to_action(&rec.action_id) || !self.overlay.gate_active(gate, context) {
                continue;
            }
            let rule = self.overlay.effective_rule(gate);
            if let Some((outcome, details)) = self.dispatch(gate, &rule, rec, context) {
                trace!(
                    recommendation_id = %rec.recommendation_id,
                    gate_id = %gate.gate_id,
                    %context,
                    %outcome,
                    "gate fired"
                );
                results.push(GateResult {
                    gate_id: gate.gate_id.clone(),
                    context,
                    outcome,
                    reason_id: gate.reason_id.clone(),
                    details,
                });
            }
        }
        results
    }

    fn dispatch(
        &self,
        gate: &GateDefinition,
        rule: &GateRule,
        rec: &Recommendation,
        context: Context,
    ) -> Option<(GateOutcome, GateDetails)> {
        match rule {
            GateRule::ApprovalRequired => {
                if !context.is_enforced() || !rec.requires_approval {
                    return None;
                }
                if self.approvals.contains(&rec.recommendation_id) {
                    return None;
                }
                Some((GateOutcome::Reject, GateDetails::ApprovalRequired))
            }
            GateRule::ActionPrefixBlock { action_prefix } => {
                if !context.is_enforced() {
                    return None;
                }
                let prefix = match (action_prefix, &gate.applies_to) {
                    (Some(prefix), _) => prefix.as_str(),
                    (None, ActionMatcher::Prefix(prefix)) => prefix.as_str(),
                    (None, ActionMatcher::Exact(id)) => id.as_str(),
                };
                rec.action_id.starts_with(prefix).then(|| {
                    (
                        GateOutcome::Reject,
                        GateDetails::ActionBlocked {
                            action_id: rec.action_id.clone(),
                            action_prefix: prefix.to_string(),
                        },
                    )
                })
            }
            GateRule::AbsMax {
                param_id,
                limit,
                use_abs,
            } => {
                let (_, value) = rec.numeric_param(param_id)?;
                let compared = if *use_abs { value.abs() } else { value };
                (compared > *limit).then(|| {
                    let suffix = if *use_abs { "abs_max" } else { "max" };
                    (
                        GateOutcome::Reject,
                        GateDetails::ParamLimit {
                            param_id: param_id.clone(),
                            value,
                            limit: *limit,
                            use_abs: *use_abs,
                            limit_kind: format!("{context}_{suffix}"),
                        },
                    )
                })
            }
            GateRule::CountMax {
                param_id_prefix,
                limit,
            } => {
                let count = rec.count_params_with_prefix(param_id_prefix);
                ((count as f64) > *limit).then(|| {
                    (
                        GateOutcome::SuggestOnly,
                        GateDetails::CountLimit {
                            param_prefix: param_id_prefix.clone(),
                            count,
                            limit: *limit,
                            limit_kind: format!("{context}_max"),
                        },
                    )
                })
            }
            GateRule::MetricDeltaMax { param_id, limit } => {
                let (_, value) = rec.numeric_param(param_id)?;
                (value > *limit).then(|| {
                    (
                        GateOutcome::SuggestOnly,
                        GateDetails::MetricDelta {
                            param_id: param_id.clone(),
                            value,
                            limit: *limit,
                            limit_kind: format!("{context}_max"),
                        },
                    )
                })
            }
        }
    }
}
