//! Authority profile registry loading and resolution.
//!
//! Registry shape:
//!
//! ```yaml
//! schema_version: "0.1.0"
//! profiles:
//!   PROFILE.GUIDE:
//!     disable_contexts: [auto_apply]
//!   PROFILE.FULL_SEND:
//!     gate_overrides:
//!       GATE.GAIN_ABS_MAX: { limit: 12.0 }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use mmo_core::constants::SUPPORTED_SCHEMA_MAJOR;
use mmo_core::errors::{ProfileError, UnknownProfileError};
use serde_json::{Map, Value};
use tracing::debug;

use super::overlay::ProfileOverlay;
use super::types::*;
use crate::document::{self, DocumentError};
use crate::policy::Context;

/// Load and validate a profile registry from disk.
pub fn load_profile_registry(path: &Path) -> Result<ProfileRegistry, ProfileError> {
    let shown = path.display().to_string();
    let root = document::read_document(path).map_err(|e| match e {
        DocumentError::NotFound => ProfileError::FileNotFound {
            path: shown.clone(),
        },
        DocumentError::Parse(message) => ProfileError::Parse {
            path: shown.clone(),
            message,
        },
    })?;
    let registry = build_registry(&root, &shown)?;
    debug!(path = %shown, profile_count = registry.len(), "loaded profile registry");
    Ok(registry)
}

/// Parse and validate a profile registry from document text.
pub fn parse_profile_registry(content: &str, is_json: bool, origin: &str) -> Result<ProfileRegistry, ProfileError> {
    let root = document::parse_document(content, is_json).map_err(|e| ProfileError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;
    build_registry(&root, origin)
}

/// Resolve the overlay for a run.
///
/// No requested profile yields the no-op overlay without touching the
/// registry. A requested profile needs a registry and must exist in it.
pub fn resolve_profile(
    profiles_path: Option<&Path>,
    profile_id: Option<&str>,
) -> Result<ProfileOverlay, ProfileError> {
    let Some(profile_id) = profile_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(ProfileOverlay::noop());
    };
    let path = profiles_path.ok_or_else(|| ProfileError::RegistryRequired {
        profile_id: profile_id.to_string(),
    })?;
    let registry = load_profile_registry(path)?;
    Ok(registry.resolve(Some(profile_id))?)
}

impl ProfileRegistry {
    /// Resolve a profile id against this registry.
    pub fn resolve(&self, profile_id: Option<&str>) -> Result<ProfileOverlay, UnknownProfileError> {
        match profile_id {
            None => Ok(ProfileOverlay::noop()),
            Some(id) => self
                .get(id)
                .cloned()
                .map(ProfileOverlay::from_profile)
                .ok_or_else(|| UnknownProfileError::new(id, self.profile_ids())),
        }
    }
}

fn build_registry(root: &Value, origin: &str) -> Result<ProfileRegistry, ProfileError> {
    let parse_err = |message: String| ProfileError::Parse {
        path: origin.to_string(),
        message,
    };

    let root = root.as_object().ok_or_else(|| {
        parse_err(format!(
            "registry must be a mapping, got {}",
            document::type_name(root)
        ))
    })?;

    let schema_version = document::schema_version(root)
        .ok_or_else(|| parse_err("missing required field schema_version".to_string()))?;
    if !document::schema_supported(&schema_version, SUPPORTED_SCHEMA_MAJOR) {
        return Err(parse_err(format!("unsupported schema_version {schema_version}")));
    }

    let entries = match root.get("profiles") {
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(parse_err(format!(
                "profiles must be a mapping, got {}",
                document::type_name(other)
            )))
        }
        None => return Err(parse_err("missing required field profiles".to_string())),
    };

    let mut profiles = BTreeMap::new();
    for (profile_id, body) in entries {
        profiles.insert(profile_id.clone(), parse_profile(profile_id, body)?);
    }

    Ok(ProfileRegistry {
        schema_version,
        profiles,
    })
}

fn parse_profile(profile_id: &str, body: &Value) -> Result<AuthorityProfile, ProfileError> {
    let empty = Map::new();
    let obj = match body {
        Value::Object(obj) => obj,
        // `PROFILE.ASSIST: ~` declares a profile with no adjustments.
        Value::Null => &empty,
        other => {
            return Err(invalid(
                profile_id,
                "profile",
                format!("must be a mapping, got {}", document::type_name(other)),
            ))
        }
    };

    let disabled_contexts = parse_context_list(obj.get("disable_contexts"), profile_id, "disable_contexts")?;

    let mut gate_overrides = BTreeMap::new();
    match obj.get("gate_overrides") {
        None | Some(Value::Null) => {}
        Some(Value::Object(overrides)) => {
            for (gate_id, raw) in overrides {
                gate_overrides.insert(gate_id.clone(), parse_override(profile_id, gate_id, raw)?);
            }
        }
        Some(other) => {
            return Err(invalid(
                profile_id,
                "gate_overrides",
                format!("must be a mapping, got {}", document::type_name(other)),
            ))
        }
    }

    Ok(AuthorityProfile {
        profile_id: profile_id.to_string(),
        disabled_contexts,
        gate_overrides,
    })
}

fn parse_override(profile_id: &str, gate_id: &str, raw: &Value) -> Result<GateOverride, ProfileError> {
    let field = |name: &str| format!("gate_overrides.{gate_id}.{name}");
    let obj = raw.as_object().ok_or_else(|| {
        invalid(
            profile_id,
            &format!("gate_overrides.{gate_id}"),
            format!("must be a mapping, got {}", document::type_name(raw)),
        )
    })?;

    let limit = match obj.get("limit") {
        None | Some(Value::Null) => None,
        Some(value) => Some(document::finite_number(value).ok_or_else(|| {
            invalid(profile_id, &field("limit"), "must be a finite number".to_string())
        })?),
    };

    let enabled = match obj.get("enabled") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            return Err(invalid(
                profile_id,
                &field("enabled"),
                "must be a boolean".to_string(),
            ))
        }
    };

    let disabled_contexts =
        parse_context_list(obj.get("disable_contexts"), profile_id, &field("disable_contexts"))?;

    Ok(GateOverride {
        limit,
        disabled_contexts,
        enabled,
    })
}

fn parse_context_list(
    value: Option<&Value>,
    profile_id: &str,
    field: &str,
) -> Result<BTreeSet<Context>, ProfileError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(BTreeSet::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(invalid(
                profile_id,
                field,
                format!("must be a list, got {}", document::type_name(other)),
            ))
        }
    };
    items
        .iter()
        .map(|item| {
            item.as_str().and_then(Context::parse).ok_or_else(|| {
                invalid(
                    profile_id,
                    field,
                    format!("unknown context {item}; expected one of suggest, auto_apply, render"),
                )
            })
        })
        .collect()
}

fn invalid(profile_id: &str, field: &str, message: String) -> ProfileError {
    ProfileError::InvalidProfile {
        profile_id: profile_id.to_string(),
        field: field.to_string(),
        message,
    }
}
