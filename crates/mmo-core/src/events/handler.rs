//! GateEventHandler trait with no-op defaults.

use super::types::*;

/// Trait for observing gate engine events.
///
/// All methods have no-op default implementations, so handlers only need
/// to override the events they care about. Evaluation may fan out across
/// rayon workers, hence `Send + Sync`.
pub trait GateEventHandler: Send + Sync {
    fn on_policy_loaded(&self, _event: &PolicyLoadedEvent) {}
    fn on_profile_resolved(&self, _event: &ProfileResolvedEvent) {}
    fn on_gate_fired(&self, _event: &GateFiredEvent) {}
    fn on_report_annotated(&self, _event: &ReportAnnotatedEvent) {}
}
