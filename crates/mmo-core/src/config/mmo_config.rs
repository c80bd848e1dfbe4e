//! Top-level MMO configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::GateConfig;
use crate::constants::PROJECT_CONFIG_FILE;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`MMO_*`)
/// 3. Project config (`mmo.toml` in project root)
/// 4. User config (`~/.mmo/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MmoConfig {
    pub gates: GateConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub policy_path: Option<PathBuf>,
    pub profiles_path: Option<PathBuf>,
    pub profile_id: Option<String>,
    pub approvals: Vec<String>,
    pub sequential: bool,
}

impl MmoConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                Self::merge_toml_file(&mut config, &user_config_path)?;
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &MmoConfig) -> Result<(), ConfigError> {
        if let Some(profile_id) = &config.gates.profile_id {
            if profile_id.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "gates.profile_id".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        for (field, path) in [
            ("gates.policy_path", &config.gates.policy_path),
            ("gates.profiles_path", &config.gates.profiles_path),
        ] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        if let Some(approval) = config.gates.approvals.iter().find(|a| a.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "gates.approvals".to_string(),
                message: format!("empty recommendation id {approval:?}"),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.mmo/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".mmo").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut MmoConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: MmoConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut MmoConfig, other: &MmoConfig) {
        if other.gates.policy_path.is_some() {
            base.gates.policy_path = other.gates.policy_path.clone();
        }
        if other.gates.profiles_path.is_some() {
            base.gates.profiles_path = other.gates.profiles_path.clone();
        }
        if other.gates.profile_id.is_some() {
            base.gates.profile_id = other.gates.profile_id.clone();
        }
        if !other.gates.approvals.is_empty() {
            base.gates.approvals = other.gates.approvals.clone();
        }
        if other.gates.parallel.is_some() {
            base.gates.parallel = other.gates.parallel;
        }
    }

    /// Apply `MMO_*` environment variables.
    fn apply_env_overrides(config: &mut MmoConfig) {
        if let Ok(val) = std::env::var("MMO_GATES_POLICY") {
            config.gates.policy_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("MMO_PROFILES") {
            config.gates.profiles_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("MMO_PROFILE") {
            let trimmed = val.trim();
            if !trimmed.is_empty() {
                config.gates.profile_id = Some(trimmed.to_string());
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    pub fn apply_cli_overrides(config: &mut MmoConfig, cli: &CliOverrides) {
        if let Some(path) = &cli.policy_path {
            config.gates.policy_path = Some(path.clone());
        }
        if let Some(path) = &cli.profiles_path {
            config.gates.profiles_path = Some(path.clone());
        }
        if let Some(profile_id) = &cli.profile_id {
            config.gates.profile_id = Some(profile_id.trim().to_string());
        }
        if !cli.approvals.is_empty() {
            config.gates.approvals = cli.approvals.clone();
        }
        if cli.sequential {
            config.gates.parallel = Some(false);
        }
    }
}
