//! Structured span field names used across the gate engine.
//!
//! Keeping the names in one place lets log queries rely on them.

/// Policy loader: number of gate definitions loaded.
pub const GATE_COUNT: &str = "gate_count";

/// Profile resolver: resolved profile id (empty for the no-op overlay).
pub const PROFILE_ID: &str = "profile_id";

/// Annotator: recommendations evaluated in one report.
pub const RECOMMENDATION_COUNT: &str = "recommendation_count";

/// Annotator: total non-passing gate results produced for one report.
pub const GATE_RESULT_COUNT: &str = "gate_result_count";

/// Annotator: wall-clock time to annotate one report, in milliseconds.
pub const GATE_EVALUATION_TIME: &str = "gate_evaluation_time";

/// Annotator: recommendations still eligible for auto-apply.
pub const AUTO_APPLY_ELIGIBLE: &str = "auto_apply_eligible";

/// Annotator: recommendations still eligible for render.
pub const RENDER_ELIGIBLE: &str = "render_eligible";
