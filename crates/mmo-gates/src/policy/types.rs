//! Core types for gate policies.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The three points at which eligibility is checked.
///
/// Declaration order is the context rank used to sort gate results:
/// `suggest < auto_apply < render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    Suggest,
    AutoApply,
    Render,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suggest => "suggest",
            Self::AutoApply => "auto_apply",
            Self::Render => "render",
        }
    }

    pub fn all() -> &'static [Context] {
        &[Self::Suggest, Self::AutoApply, Self::Render]
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "suggest" => Some(Self::Suggest),
            "auto_apply" => Some(Self::AutoApply),
            "render" => Some(Self::Render),
            _ => None,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Self::Suggest => 0,
            Self::AutoApply => 1,
            Self::Render => 2,
        }
    }

    /// `auto_apply` and `render` gate real actions; `suggest` is audit-only.
    pub fn is_enforced(&self) -> bool {
        !matches!(self, Self::Suggest)
    }

    /// Reason id for a context disabled by an authority profile,
    /// e.g. `PROFILE_AUTO_APPLY_DISABLED`.
    pub fn profile_disabled_reason_id(&self) -> String {
        format!("PROFILE_{}_DISABLED", self.as_str().to_ascii_uppercase())
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-passing gate outcome. A pass is never materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    Reject,
    SuggestOnly,
}

impl GateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::SuggestOnly => "suggest_only",
        }
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which recommendations a gate applies to, by `action_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMatcher {
    /// `applies_to.action_id`
    Exact(String),
    /// `applies_to.action_prefix`; an empty prefix matches every action.
    Prefix(String),
}

impl ActionMatcher {
    pub fn matches(&self, action_id: &str) -> bool {
        match self {
            Self::Exact(id) => action_id == id,
            Self::Prefix(prefix) => action_id.starts_with(prefix.as_str()),
        }
    }
}

/// The closed set of rule kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateRule {
    /// Reject when the named param's magnitude exceeds `limit`.
    /// With `use_abs == false` the signed value is compared instead.
    AbsMax {
        param_id: String,
        limit: f64,
        use_abs: bool,
    },
    /// Demote to suggest-only when more than `limit` params share the prefix.
    CountMax { param_id_prefix: String, limit: f64 },
    /// Demote to suggest-only when a measured delta exceeds `limit`.
    MetricDeltaMax { param_id: String, limit: f64 },
    /// Reject recommendations flagged `requires_approval`.
    ApprovalRequired,
    /// Reject actions under a category prefix. Without an explicit prefix the
    /// gate's `applies_to` match is the block.
    ActionPrefixBlock { action_prefix: Option<String> },
}

impl GateRule {
    /// The policy document spelling of the rule type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::AbsMax { .. } => "abs_max",
            Self::CountMax { .. } => "count_max",
            Self::MetricDeltaMax { .. } => "metric_delta_max",
            Self::ApprovalRequired => "approval_required",
            Self::ActionPrefixBlock { .. } => "action_prefix_block",
        }
    }

    /// The numeric threshold, for rule kinds that have one.
    pub fn limit(&self) -> Option<f64> {
        match self {
            Self::AbsMax { limit, .. }
            | Self::CountMax { limit, .. }
            | Self::MetricDeltaMax { limit, .. } => Some(*limit),
            Self::ApprovalRequired | Self::ActionPrefixBlock { .. } => None,
        }
    }

    /// A copy of this rule with its threshold replaced. Rules without a
    /// threshold are returned unchanged.
    pub fn with_limit(&self, new_limit: f64) -> GateRule {
        let mut rule = self.clone();
        match &mut rule {
            Self::AbsMax { limit, .. }
            | Self::CountMax { limit, .. }
            | Self::MetricDeltaMax { limit, .. } => *limit = new_limit,
            Self::ApprovalRequired | Self::ActionPrefixBlock { .. } => {}
        }
        rule
    }
}

/// One named policy rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    pub gate_id: String,
    pub applies_to: ActionMatcher,
    /// Never empty.
    pub contexts: BTreeSet<Context>,
    pub rule: GateRule,
    pub reason_id: String,
    /// Disabled gates are validated but never evaluated.
    pub enabled: bool,
}

impl GateDefinition {
    pub fn applies_to_action(&self, action_id: &str) -> bool {
        self.applies_to.matches(action_id)
    }

    pub fn covers(&self, context: Context) -> bool {
        self.contexts.contains(&context)
    }
}

/// A loaded, validated policy document. Immutable after construction.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    schema_version: String,
    source: Option<PathBuf>,
    /// Sorted by `gate_id`.
    gates: Vec<GateDefinition>,
    index: FxHashMap<String, usize>,
}

impl GatePolicy {
    /// Build a policy from already-validated definitions. Definitions are
    /// re-sorted by `gate_id` so iteration order never depends on input order.
    pub fn new(schema_version: impl Into<String>, mut gates: Vec<GateDefinition>) -> Self {
        gates.sort_by(|a, b| a.gate_id.cmp(&b.gate_id));
        let index = gates
            .iter()
            .enumerate()
            .map(|(i, gate)| (gate.gate_id.clone(), i))
            .collect();
        Self {
            schema_version: schema_version.into(),
            source: None,
            gates,
            index,
        }
    }

    pub(crate) fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn source(&self) -> Option<&std::path::Path> {
        self.source.as_deref()
    }

    pub fn gates(&self) -> &[GateDefinition] {
        &self.gates
    }

    pub fn get(&self, gate_id: &str) -> Option<&GateDefinition> {
        self.index.get(gate_id).map(|&i| &self.gates[i])
    }

    pub fn contains(&self, gate_id: &str) -> bool {
        self.index.contains_key(gate_id)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn gate_ids(&self) -> impl Iterator<Item = &str> {
        self.gates.iter().map(|g| g.gate_id.as_str())
    }
}
