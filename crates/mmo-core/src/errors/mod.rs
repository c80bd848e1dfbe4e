//! Error handling for the MMO gate engine.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod error_code;
pub mod gate_error;
pub mod policy_error;
pub mod profile_error;

pub use config_error::ConfigError;
pub use error_code::MmoErrorCode;
pub use gate_error::GateError;
pub use policy_error::{GateDefinitionError, PolicyLoadError};
pub use profile_error::{ProfileError, UnknownProfileError};
