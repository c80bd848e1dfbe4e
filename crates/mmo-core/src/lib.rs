//! Core types shared by the MMO gate engine crates.
//!
//! - `errors`: one `thiserror` enum per subsystem plus `MmoErrorCode`
//! - `config`: TOML configuration with layered resolution
//! - `tracing`: subscriber setup and standard span field names
//! - `events`: observer hooks for policy loading and gate evaluation
//! - `constants`: defaults shared across crates

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing;
