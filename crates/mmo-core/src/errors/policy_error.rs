//! Gate policy document errors.

use super::error_code::{self, MmoErrorCode};

/// A single gate definition failed validation.
///
/// Every variant names the offending `gate_id` so the message points at the
/// exact entry in the policy document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GateDefinitionError {
    #[error("Duplicate gate_id: {gate_id}")]
    DuplicateGateId { gate_id: String },

    #[error("Unknown rule type for {gate_id}: {rule_type}")]
    UnknownRuleType { gate_id: String, rule_type: String },

    #[error("Invalid contexts for {gate_id}: {message}")]
    InvalidContexts { gate_id: String, message: String },

    #[error("Invalid field {field} for {gate_id}: {message}")]
    InvalidField {
        gate_id: String,
        field: String,
        message: String,
    },
}

impl GateDefinitionError {
    /// The gate the error refers to.
    pub fn gate_id(&self) -> &str {
        match self {
            Self::DuplicateGateId { gate_id }
            | Self::UnknownRuleType { gate_id, .. }
            | Self::InvalidContexts { gate_id, .. }
            | Self::InvalidField { gate_id, .. } => gate_id,
        }
    }
}

impl MmoErrorCode for GateDefinitionError {
    fn error_code(&self) -> &'static str {
        error_code::GATE_DEFINITION_ERROR
    }
}

/// Errors raised while reading a policy document. Always fatal: a policy is
/// either loaded completely or not at all.
#[derive(Debug, thiserror::Error)]
pub enum PolicyLoadError {
    #[error("Policy file not found: {path}")]
    FileNotFound { path: String },

    #[error("Policy parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Policy {path} is missing required field {field}")]
    MissingField { path: String, field: String },

    #[error("Policy {path} has unsupported schema_version {version}")]
    UnsupportedSchemaVersion { path: String, version: String },

    #[error("Policy gate definition error: {0}")]
    Definition(#[from] GateDefinitionError),
}

impl MmoErrorCode for PolicyLoadError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Definition(e) => e.error_code(),
            _ => error_code::POLICY_LOAD_ERROR,
        }
    }
}
