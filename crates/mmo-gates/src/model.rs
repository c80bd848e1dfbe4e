//! Report and recommendation wire format.
//!
//! Recommendations are produced upstream; this crate only adds
//! `gate_results`, `eligible_auto_apply` and `eligible_render`. Fields it does
//! not know about are carried through untouched via `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::policy::{Context, GateOutcome};

/// One parameter of a proposed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub param_id: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Param {
    pub fn new(param_id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            param_id: param_id.into(),
            value: value.into(),
            unit_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_unit(mut self, unit_id: impl Into<String>) -> Self {
        self.unit_id = Some(unit_id.into());
        self
    }

    /// The value as a finite number. Numeric strings are coerced; anything
    /// else (booleans, ids, NaN, infinities) is not numeric.
    pub fn numeric_value(&self) -> Option<f64> {
        let n = match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }
}

/// One serialized gate result as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResultRecord {
    pub gate_id: String,
    pub context: Context,
    pub outcome: GateOutcome,
    pub reason_id: String,
    #[serde(default)]
    pub details: Map<String, Value>,
}

/// A proposed, parameterized action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub recommendation_id: String,
    #[serde(default)]
    pub action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub gate_results: Vec<GateResultRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_auto_apply: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_render: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Recommendation {
    pub fn new(recommendation_id: impl Into<String>, action_id: impl Into<String>) -> Self {
        Self {
            recommendation_id: recommendation_id.into(),
            action_id: action_id.into(),
            risk: None,
            requires_approval: false,
            params: Vec::new(),
            gate_results: Vec::new(),
            eligible_auto_apply: None,
            eligible_render: None,
            extra: Map::new(),
        }
    }

    pub fn with_risk(mut self, risk: impl Into<String>) -> Self {
        self.risk = Some(risk.into());
        self
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn requiring_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }

    /// First param with `param_id` that carries a numeric value.
    pub fn numeric_param(&self, param_id: &str) -> Option<(&Param, f64)> {
        self.params
            .iter()
            .filter(|p| p.param_id == param_id)
            .find_map(|p| p.numeric_value().map(|v| (p, v)))
    }

    /// Number of params whose id starts with `prefix`.
    pub fn count_params_with_prefix(&self, prefix: &str) -> usize {
        self.params
            .iter()
            .filter(|p| p.param_id.starts_with(prefix))
            .count()
    }

    /// Whether annotation has run on this recommendation.
    pub fn is_annotated(&self) -> bool {
        self.eligible_auto_apply.is_some() && self.eligible_render.is_some()
    }
}

/// A report carrying recommendations. Everything besides `recommendations`
/// and `profile_id` belongs to other pipeline stages and is preserved as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    pub fn new(recommendations: Vec<Recommendation>) -> Self {
        Self {
            profile_id: None,
            recommendations,
            extra: Map::new(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Pretty JSON with keys sorted at every level and a trailing newline, so
    /// identical reports serialize to identical bytes.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        // Round-tripping through `Value` sorts object keys.
        let value = serde_json::to_value(self)?;
        let mut out = serde_json::to_string_pretty(&value)?;
        out.push('\n');
        Ok(out)
    }
}
