//! Policy document loader.
//!
//! Document shape:
//!
//! ```yaml
//! schema_version: "0.1.0"
//! gates:
//!   - gate_id: GATE.GAIN_ABS_MAX
//!     applies_to: { action_id: ACTION.UTILITY.GAIN }
//!     contexts: [auto_apply]
//!     rule: { type: abs_max, param_id: PARAM.GAIN.DB, limit: 3.0, use_abs: true }
//!     reason_id: GAIN_TOO_LARGE
//! ```
//!
//! Loading is all-or-nothing: the first invalid gate aborts with an error
//! naming that gate and field.

use std::collections::BTreeSet;
use std::path::Path;

use mmo_core::constants::SUPPORTED_SCHEMA_MAJOR;
use mmo_core::errors::{GateDefinitionError, PolicyLoadError};
use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use tracing::debug;

use super::types::*;
use crate::document::{self, DocumentError};

/// Load and validate a gate policy document from disk.
pub fn load_gate_policy(path: &Path) -> Result<GatePolicy, PolicyLoadError> {
    let shown = path.display().to_string();
    let root = document::read_document(path).map_err(|e| match e {
        DocumentError::NotFound => PolicyLoadError::FileNotFound {
            path: shown.clone(),
        },
        DocumentError::Parse(message) => PolicyLoadError::Parse {
            path: shown.clone(),
            message,
        },
    })?;
    let policy = build_policy(&root, &shown)?.with_source(path.to_path_buf());
    debug!(
        path = %shown,
        gate_count = policy.len(),
        schema_version = policy.schema_version(),
        "loaded gate policy"
    );
    Ok(policy)
}

/// Parse and validate a gate policy from document text. `origin` is only used
/// in error messages.
pub fn parse_gate_policy(content: &str, is_json: bool, origin: &str) -> Result<GatePolicy, PolicyLoadError> {
    let root = document::parse_document(content, is_json).map_err(|e| PolicyLoadError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;
    build_policy(&root, origin)
}

fn build_policy(root: &Value, origin: &str) -> Result<GatePolicy, PolicyLoadError> {
    let root = root.as_object().ok_or_else(|| PolicyLoadError::Parse {
        path: origin.to_string(),
        message: format!("policy must be a mapping, got {}", document::type_name(root)),
    })?;

    let schema_version =
        document::schema_version(root).ok_or_else(|| PolicyLoadError::MissingField {
            path: origin.to_string(),
            field: "schema_version".to_string(),
        })?;
    if !document::schema_supported(&schema_version, SUPPORTED_SCHEMA_MAJOR) {
        return Err(PolicyLoadError::UnsupportedSchemaVersion {
            path: origin.to_string(),
            version: schema_version,
        });
    }

    let entries = match root.get("gates") {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(PolicyLoadError::Parse {
                path: origin.to_string(),
                message: format!("gates must be a list, got {}", document::type_name(other)),
            })
        }
        None => {
            return Err(PolicyLoadError::MissingField {
                path: origin.to_string(),
                field: "gates".to_string(),
            })
        }
    };

    let mut seen = FxHashSet::default();
    let mut gates = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let gate = parse_gate(entry, position)?;
        if !seen.insert(gate.gate_id.clone()) {
            return Err(GateDefinitionError::DuplicateGateId {
                gate_id: gate.gate_id,
            }
            .into());
        }
        gates.push(gate);
    }

    Ok(GatePolicy::new(schema_version, gates))
}

/// Validate one entry of the `gates` list.
fn parse_gate(entry: &Value, position: usize) -> Result<GateDefinition, GateDefinitionError> {
    // Until gate_id is known, errors cite the list position.
    let placeholder = format!("gates[{position}]");
    let obj = entry.as_object().ok_or_else(|| GateDefinitionError::InvalidField {
        gate_id: placeholder.clone(),
        field: "gate".to_string(),
        message: format!("must be a mapping, got {}", document::type_name(entry)),
    })?;

    let gate_id = required_str(obj, &placeholder, "gate_id")?;
    let applies_to = parse_applies_to(obj, &gate_id)?;
    let contexts = parse_contexts(obj, &gate_id)?;
    let rule = parse_rule(obj, &gate_id)?;
    let reason_id = required_str(obj, &gate_id, "reason_id")?;
    let enabled = match obj.get("enabled") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(invalid(
                &gate_id,
                "enabled",
                format!("must be a boolean, got {}", document::type_name(other)),
            ))
        }
    };

    Ok(GateDefinition {
        gate_id,
        applies_to,
        contexts,
        rule,
        reason_id,
        enabled,
    })
}

fn parse_applies_to(obj: &Map<String, Value>, gate_id: &str) -> Result<ActionMatcher, GateDefinitionError> {
    let applies_to = match obj.get("applies_to") {
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(invalid(
                gate_id,
                "applies_to",
                format!("must be a mapping, got {}", document::type_name(other)),
            ))
        }
        None => return Err(invalid(gate_id, "applies_to", "is required".to_string())),
    };

    let exact = applies_to.get("action_id");
    let prefix = applies_to.get("action_prefix");
    match (exact, prefix) {
        (Some(_), Some(_)) => Err(invalid(
            gate_id,
            "applies_to",
            "set exactly one of action_id or action_prefix".to_string(),
        )),
        (Some(Value::String(id)), None) if !id.trim().is_empty() => {
            Ok(ActionMatcher::Exact(id.clone()))
        }
        (Some(_), None) => Err(invalid(
            gate_id,
            "applies_to.action_id",
            "must be a non-empty string".to_string(),
        )),
        (None, Some(Value::String(prefix))) => Ok(ActionMatcher::Prefix(prefix.clone())),
        (None, Some(_)) => Err(invalid(
            gate_id,
            "applies_to.action_prefix",
            "must be a string".to_string(),
        )),
        (None, None) => Err(invalid(
            gate_id,
            "applies_to",
            "set exactly one of action_id or action_prefix".to_string(),
        )),
    }
}

fn parse_contexts(obj: &Map<String, Value>, gate_id: &str) -> Result<BTreeSet<Context>, GateDefinitionError> {
    let items = match obj.get("contexts") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(GateDefinitionError::InvalidContexts {
                gate_id: gate_id.to_string(),
                message: format!("must be a list, got {}", document::type_name(other)),
            })
        }
        None => {
            return Err(GateDefinitionError::InvalidContexts {
                gate_id: gate_id.to_string(),
                message: "is required".to_string(),
            })
        }
    };

    let mut contexts = BTreeSet::new();
    for item in items {
        let context = item.as_str().and_then(Context::parse).ok_or_else(|| {
            GateDefinitionError::InvalidContexts {
                gate_id: gate_id.to_string(),
                message: format!(
                    "unknown context {item}; expected one of suggest, auto_apply, render"
                ),
            }
        })?;
        contexts.insert(context);
    }
    if contexts.is_empty() {
        return Err(GateDefinitionError::InvalidContexts {
            gate_id: gate_id.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(contexts)
}

/// The one place rule-type strings are interpreted. Everything downstream
/// matches on `GateRule`.
fn parse_rule(obj: &Map<String, Value>, gate_id: &str) -> Result<GateRule, GateDefinitionError> {
    let rule = match obj.get("rule") {
        Some(Value::Object(rule)) => rule,
        Some(other) => {
            return Err(invalid(
                gate_id,
                "rule",
                format!("must be a mapping, got {}", document::type_name(other)),
            ))
        }
        None => return Err(invalid(gate_id, "rule", "is required".to_string())),
    };

    let rule_type = match rule.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(_) => return Err(invalid(gate_id, "rule.type", "must be a string".to_string())),
        None => return Err(invalid(gate_id, "rule.type", "is required".to_string())),
    };

    match rule_type {
        "abs_max" => Ok(GateRule::AbsMax {
            param_id: rule_str(rule, gate_id, "param_id")?,
            limit: rule_limit(rule, gate_id)?,
            use_abs: match rule.get("use_abs") {
                None => true,
                Some(Value::Bool(b)) => *b,
                Some(_) => {
                    return Err(invalid(gate_id, "rule.use_abs", "must be a boolean".to_string()))
                }
            },
        }),
        "count_max" => Ok(GateRule::CountMax {
            param_id_prefix: rule_str(rule, gate_id, "param_prefix")?,
            limit: rule_limit(rule, gate_id)?,
        }),
        "metric_delta_max" => Ok(GateRule::MetricDeltaMax {
            param_id: rule_str(rule, gate_id, "param_id")?,
            limit: rule_limit(rule, gate_id)?,
        }),
        "approval_required" => Ok(GateRule::ApprovalRequired),
        "action_prefix_block" => Ok(GateRule::ActionPrefixBlock {
            action_prefix: match rule.get("action_prefix") {
                None | Some(Value::Null) => None,
                Some(Value::String(prefix)) if !prefix.is_empty() => Some(prefix.clone()),
                Some(_) => {
                    return Err(invalid(
                        gate_id,
                        "rule.action_prefix",
                        "must be a non-empty string".to_string(),
                    ))
                }
            },
        }),
        other => Err(GateDefinitionError::UnknownRuleType {
            gate_id: gate_id.to_string(),
            rule_type: other.to_string(),
        }),
    }
}

fn rule_str(rule: &Map<String, Value>, gate_id: &str, field: &str) -> Result<String, GateDefinitionError> {
    match rule.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(_) => Err(invalid(
            gate_id,
            &format!("rule.{field}"),
            "must be a non-empty string".to_string(),
        )),
        None => Err(invalid(gate_id, &format!("rule.{field}"), "is required".to_string())),
    }
}

fn rule_limit(rule: &Map<String, Value>, gate_id: &str) -> Result<f64, GateDefinitionError> {
    let value = rule
        .get("limit")
        .ok_or_else(|| invalid(gate_id, "rule.limit", "is required".to_string()))?;
    document::finite_number(value)
        .ok_or_else(|| invalid(gate_id, "rule.limit", "must be a finite number".to_string()))
}

fn required_str(obj: &Map<String, Value>, gate_id: &str, field: &str) -> Result<String, GateDefinitionError> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(_) => Err(invalid(gate_id, field, "must be a non-empty string".to_string())),
        None => Err(invalid(gate_id, field, "is required".to_string())),
    }
}

fn invalid(gate_id: &str, field: &str, message: String) -> GateDefinitionError {
    GateDefinitionError::InvalidField {
        gate_id: gate_id.to_string(),
        field: field.to_string(),
        message,
    }
}
