//! Shared constants for the MMO gate engine.

/// Default gate policy document, relative to the project root.
pub const DEFAULT_POLICY_PATH: &str = "ontology/policies/gates.yaml";

/// Default authority profile registry, relative to the project root.
pub const DEFAULT_PROFILES_PATH: &str = "ontology/policies/authority_profiles.yaml";

/// Project-level config file name.
pub const PROJECT_CONFIG_FILE: &str = "mmo.toml";

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "MMO_LOG";

/// Filter used when `MMO_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "mmo=info";

/// Schema major version accepted for policy and profile documents.
pub const SUPPORTED_SCHEMA_MAJOR: &str = "0";

/// Gate id stamped on results synthesized by a profile context disable.
pub const PROFILE_GATE_ID: &str = "GATE.AUTHORITY_PROFILE";

/// Recommendations per report above which evaluation fans out with rayon.
pub const PARALLEL_RECOMMENDATION_THRESHOLD: usize = 64;
