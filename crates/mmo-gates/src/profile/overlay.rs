//! The resolved profile overlay consulted by the evaluator.

use std::borrow::Cow;

use super::types::{AuthorityProfile, GateOverride};
use crate::policy::{Context, GateDefinition, GatePolicy, GateRule};

/// A resolved authority profile, or the no-op overlay when none was requested.
///
/// The overlay never mutates the base policy: adjusted thresholds are handed
/// out as borrowed-or-owned rules per evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileOverlay {
    profile: Option<AuthorityProfile>,
}

impl ProfileOverlay {
    /// The overlay that changes nothing.
    pub fn noop() -> Self {
        Self { profile: None }
    }

    pub fn from_profile(profile: AuthorityProfile) -> Self {
        Self {
            profile: Some(profile),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.profile.is_none()
    }

    pub fn profile(&self) -> Option<&AuthorityProfile> {
        self.profile.as_ref()
    }

    pub fn profile_id(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.profile_id.as_str())
    }

    /// Whether the profile disables `context` for every recommendation.
    pub fn context_disabled(&self, context: Context) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| p.disabled_contexts.contains(&context))
    }

    fn gate_override(&self, gate_id: &str) -> Option<&GateOverride> {
        self.profile.as_ref()?.gate_overrides.get(gate_id)
    }

    /// Whether `gate` takes part in evaluation for `context` once the
    /// profile's per-gate switches are applied.
    pub fn gate_active(&self, gate: &GateDefinition, context: Context) -> bool {
        if !gate.enabled || !gate.covers(context) {
            return false;
        }
        match self.gate_override(&gate.gate_id) {
            Some(o) => o.enabled != Some(false) && !o.disabled_contexts.contains(&context),
            None => true,
        }
    }

    /// The rule to evaluate for `gate`, with any threshold override applied.
    pub fn effective_rule<'a>(&self, gate: &'a GateDefinition) -> Cow<'a, GateRule> {
        match self.gate_override(&gate.gate_id).and_then(|o| o.limit) {
            Some(limit) if gate.rule.limit().is_some() => Cow::Owned(gate.rule.with_limit(limit)),
            _ => Cow::Borrowed(&gate.rule),
        }
    }

    /// Override targets that do not exist in `policy`, in ascending order.
    pub fn unknown_override_targets(&self, policy: &GatePolicy) -> Vec<String> {
        match &self.profile {
            Some(profile) => profile
                .gate_overrides
                .keys()
                .filter(|gate_id| !policy.contains(gate_id))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::policy::ActionMatcher;

    fn gain_gate() -> GateDefinition {
        GateDefinition {
            gate_id: "GATE.GAIN_ABS_MAX".into(),
            applies_to: ActionMatcher::Exact("ACTION.UTILITY.GAIN".into()),
            contexts: BTreeSet::from([Context::AutoApply, Context::Render]),
            rule: GateRule::AbsMax {
                param_id: "PARAM.GAIN.DB".into(),
                limit: 3.0,
                use_abs: true,
            },
            reason_id: "GAIN_TOO_LARGE".into(),
            enabled: true,
        }
    }

    #[test]
    fn test_noop_changes_nothing() {
        let overlay = ProfileOverlay::noop();
        let gate = gain_gate();
        assert!(overlay.is_noop());
        assert!(!overlay.context_disabled(Context::AutoApply));
        assert!(overlay.gate_active(&gate, Context::AutoApply));
        assert!(!overlay.gate_active(&gate, Context::Suggest));
        assert!(matches!(overlay.effective_rule(&gate), Cow::Borrowed(_)));
    }

    #[test]
    fn test_limit_override_is_copy_on_write() {
        let gate = gain_gate();
        let overlay = ProfileOverlay::from_profile(AuthorityProfile::new("PROFILE.FULL_SEND").override_gate(
            "GATE.GAIN_ABS_MAX",
            GateOverride {
                limit: Some(12.0),
                ..GateOverride::default()
            },
        ));
        assert_eq!(overlay.effective_rule(&gate).limit(), Some(12.0));
        assert_eq!(gate.rule.limit(), Some(3.0));
    }

    #[test]
    fn test_per_gate_context_disable() {
        let gate = gain_gate();
        let overlay = ProfileOverlay::from_profile(AuthorityProfile::new("PROFILE.X").override_gate(
            "GATE.GAIN_ABS_MAX",
            GateOverride {
                disabled_contexts: BTreeSet::from([Context::Render]),
                ..GateOverride::default()
            },
        ));
        assert!(overlay.gate_active(&gate, Context::AutoApply));
        assert!(!overlay.gate_active(&gate, Context::Render));
        assert!(!overlay.context_disabled(Context::Render));
    }

    #[test]
    fn test_disabled_gate_is_inactive() {
        let mut gate = gain_gate();
        gate.enabled = false;
        assert!(!ProfileOverlay::noop().gate_active(&gate, Context::AutoApply));
    }
}
