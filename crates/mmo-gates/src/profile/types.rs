//! Authority profile types.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::policy::Context;

/// Per-gate adjustments a profile makes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateOverride {
    /// Replacement threshold, used for evaluation only.
    pub limit: Option<f64>,
    /// Contexts in which this one gate is skipped.
    pub disabled_contexts: BTreeSet<Context>,
    /// `Some(false)` skips the gate entirely.
    pub enabled: Option<bool>,
}

/// One named profile from the registry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityProfile {
    pub profile_id: String,
    /// Contexts disabled for every recommendation.
    pub disabled_contexts: BTreeSet<Context>,
    pub gate_overrides: BTreeMap<String, GateOverride>,
}

impl AuthorityProfile {
    pub fn new(profile_id: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            disabled_contexts: BTreeSet::new(),
            gate_overrides: BTreeMap::new(),
        }
    }

    pub fn disable_context(mut self, context: Context) -> Self {
        self.disabled_contexts.insert(context);
        self
    }

    pub fn override_gate(mut self, gate_id: impl Into<String>, gate_override: GateOverride) -> Self {
        self.gate_overrides.insert(gate_id.into(), gate_override);
        self
    }
}

/// All profiles of a registry document, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    pub schema_version: String,
    pub profiles: BTreeMap<String, AuthorityProfile>,
}

impl ProfileRegistry {
    pub fn get(&self, profile_id: &str) -> Option<&AuthorityProfile> {
        self.profiles.get(profile_id)
    }

    /// Profile ids in ascending order.
    pub fn profile_ids(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
