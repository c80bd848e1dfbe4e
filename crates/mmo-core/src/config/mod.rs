//! Configuration system for the MMO gate engine.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod gate_config;
pub mod mmo_config;

pub use gate_config::GateConfig;
pub use mmo_config::{CliOverrides, MmoConfig};
