//! Gate engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_POLICY_PATH, DEFAULT_PROFILES_PATH};

/// Configuration for gate evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Gate policy document. Default: `ontology/policies/gates.yaml`.
    pub policy_path: Option<PathBuf>,
    /// Authority profile registry. Default: `ontology/policies/authority_profiles.yaml`.
    pub profiles_path: Option<PathBuf>,
    /// Authority profile to apply. Default: none (no-op overlay).
    pub profile_id: Option<String>,
    /// Recommendation ids that were explicitly approved.
    #[serde(default)]
    pub approvals: Vec<String>,
    /// Evaluate recommendations with rayon. Default: true.
    pub parallel: Option<bool>,
}

impl GateConfig {
    /// Returns the policy path, resolved against `root` when relative.
    pub fn effective_policy_path(&self, root: &Path) -> PathBuf {
        resolve(root, self.policy_path.as_deref(), DEFAULT_POLICY_PATH)
    }

    /// Returns the profile registry path, resolved against `root` when relative.
    pub fn effective_profiles_path(&self, root: &Path) -> PathBuf {
        resolve(root, self.profiles_path.as_deref(), DEFAULT_PROFILES_PATH)
    }

    /// Returns whether recommendations are evaluated in parallel, defaulting to true.
    pub fn effective_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }
}

fn resolve(root: &Path, configured: Option<&Path>, default: &str) -> PathBuf {
    let path = configured.unwrap_or_else(|| Path::new(default));
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
