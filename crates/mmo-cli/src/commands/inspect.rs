//! `check-policy` and `list-profiles`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use mmo_core::config::{CliOverrides, MmoConfig};
use mmo_core::errors::GateError;
use mmo_gates::{load_gate_policy, load_profile_registry};

pub fn check_policy(root: &Path, policy: Option<PathBuf>) -> Result<()> {
    let overrides = CliOverrides {
        policy_path: policy,
        ..Default::default()
    };
    let config = MmoConfig::load(root, Some(&overrides)).map_err(GateError::from)?;
    let path = config.gates.effective_policy_path(root);
    let policy = load_gate_policy(&path).map_err(GateError::from)?;

    for gate in policy.gates() {
        let contexts: Vec<&str> = gate.contexts.iter().map(|c| c.as_str()).collect();
        let state = if gate.enabled { "" } else { " (disabled)" };
        println!(
            "{}\t{}\t{}\t{}{}",
            gate.gate_id,
            gate.rule.type_name(),
            contexts.join(","),
            gate.reason_id,
            state
        );
    }
    println!(
        "{}: {} gates, schema_version {}",
        path.display(),
        policy.len(),
        policy.schema_version()
    );
    Ok(())
}

pub fn list_profiles(root: &Path, profiles: Option<PathBuf>) -> Result<()> {
    let overrides = CliOverrides {
        profiles_path: profiles,
        ..Default::default()
    };
    let config = MmoConfig::load(root, Some(&overrides)).map_err(GateError::from)?;
    let path = config.gates.effective_profiles_path(root);
    let registry = load_profile_registry(&path).map_err(GateError::from)?;

    for profile_id in registry.profile_ids() {
        println!("{profile_id}");
    }
    Ok(())
}
