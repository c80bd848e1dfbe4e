//! Event payload types.

use std::path::PathBuf;

/// Payload for `on_policy_loaded`.
#[derive(Debug, Clone)]
pub struct PolicyLoadedEvent {
    pub path: PathBuf,
    pub schema_version: String,
    pub gate_count: usize,
}

/// Payload for `on_profile_resolved`. `profile_id` is `None` for the no-op overlay.
#[derive(Debug, Clone)]
pub struct ProfileResolvedEvent {
    pub profile_id: Option<String>,
    pub disabled_contexts: Vec<String>,
    pub override_count: usize,
}

/// Payload for `on_gate_fired`.
#[derive(Debug, Clone)]
pub struct GateFiredEvent {
    pub recommendation_id: String,
    pub gate_id: String,
    pub context: String,
    pub outcome: String,
    pub reason_id: String,
}

/// Payload for `on_report_annotated`.
#[derive(Debug, Clone)]
pub struct ReportAnnotatedEvent {
    pub profile_id: Option<String>,
    pub recommendation_count: usize,
    pub auto_apply_eligible: usize,
    pub render_eligible: usize,
    pub duration_ms: u64,
}
