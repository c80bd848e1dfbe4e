//! Observer hooks for the gate engine.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::GateEventHandler;
pub use types::*;
