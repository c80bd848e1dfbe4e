//! Authority profile registry errors.

use super::error_code::{self, MmoErrorCode};

/// A requested profile id is not present in the registry.
///
/// `available` is kept sorted so the rendered message is identical across runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown profile_id: {requested}. Available: {}", format_available(.available))]
pub struct UnknownProfileError {
    pub requested: String,
    pub available: Vec<String>,
}

impl UnknownProfileError {
    pub fn new(requested: impl Into<String>, mut available: Vec<String>) -> Self {
        available.sort();
        available.dedup();
        Self {
            requested: requested.into(),
            available,
        }
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "(none)".to_string()
    } else {
        available.join(", ")
    }
}

impl MmoErrorCode for UnknownProfileError {
    fn error_code(&self) -> &'static str {
        error_code::UNKNOWN_PROFILE
    }
}

/// Errors raised while resolving an authority profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile registry not found: {path}")]
    FileNotFound { path: String },

    #[error("Profile registry parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid field {field} in profile {profile_id}: {message}")]
    InvalidProfile {
        profile_id: String,
        field: String,
        message: String,
    },

    #[error("Profile {profile_id} requested but no profile registry was given")]
    RegistryRequired { profile_id: String },

    #[error(transparent)]
    UnknownProfile(#[from] UnknownProfileError),
}

impl MmoErrorCode for ProfileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownProfile(e) => e.error_code(),
            _ => error_code::PROFILE_LOAD_ERROR,
        }
    }
}
