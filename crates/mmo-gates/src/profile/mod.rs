//! Authority profiles: named overlays over a gate policy.

pub mod overlay;
pub mod resolver;
pub mod types;

pub use overlay::ProfileOverlay;
pub use resolver::{load_profile_registry, parse_profile_registry, resolve_profile};
pub use types::*;
