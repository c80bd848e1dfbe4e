//! Top-level gate engine error.

use super::error_code::{self, MmoErrorCode};
use super::{ConfigError, GateDefinitionError, PolicyLoadError, ProfileError};

/// Errors surfaced by `apply_gates` and the CLI.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyLoadError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Report error in {path}: {message}")]
    Report { path: String, message: String },
}

impl From<GateDefinitionError> for GateError {
    fn from(e: GateDefinitionError) -> Self {
        Self::Policy(PolicyLoadError::Definition(e))
    }
}

impl MmoErrorCode for GateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Policy(e) => e.error_code(),
            Self::Profile(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Report { .. } => error_code::REPORT_ERROR,
        }
    }
}
