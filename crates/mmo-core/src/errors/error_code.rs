//! MmoErrorCode trait for stable, machine-readable error codes.

/// Trait for attaching a stable error code to every MMO error enum.
/// The CLI prints `[ERROR_CODE] message` so repeated runs over the same
/// input produce identical diagnostics.
pub trait MmoErrorCode {
    /// Returns the error code string (e.g., "POLICY_LOAD_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const POLICY_LOAD_ERROR: &str = "POLICY_LOAD_ERROR";
pub const GATE_DEFINITION_ERROR: &str = "GATE_DEFINITION_ERROR";
pub const PROFILE_LOAD_ERROR: &str = "PROFILE_LOAD_ERROR";
pub const UNKNOWN_PROFILE: &str = "UNKNOWN_PROFILE";
pub const REPORT_ERROR: &str = "REPORT_ERROR";
