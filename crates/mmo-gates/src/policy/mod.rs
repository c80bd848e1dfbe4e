//! Gate policy: typed gate definitions loaded from a policy document.

pub mod loader;
pub mod types;

pub use loader::{load_gate_policy, parse_gate_policy};
pub use types::*;
