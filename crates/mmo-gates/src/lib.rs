//! Gate policy and eligibility engine.
//!
//! Subsystems:
//! - `policy`: gate policy documents → validated `GateDefinition`s
//! - `profile`: authority profile registry → `ProfileOverlay`
//! - `evaluator`: per-context rule dispatch for one recommendation
//! - `eligibility`: result ordering and the two eligibility flags
//! - `annotator`: `GateEngine` and `apply_gates` over whole reports
//! - `model`: the report / recommendation wire format

pub mod annotator;
pub mod document;
pub mod eligibility;
pub mod evaluator;
pub mod model;
pub mod policy;
pub mod profile;

pub use annotator::{apply_gates, EligibilitySummary, GateEngine};
pub use eligibility::Eligibility;
pub use evaluator::{GateDetails, GateEvaluator, GateResult};
pub use model::{GateResultRecord, Param, Recommendation, Report};
pub use policy::{load_gate_policy, ActionMatcher, Context, GateDefinition, GateOutcome, GatePolicy, GateRule};
pub use profile::{
    load_profile_registry, resolve_profile, AuthorityProfile, GateOverride, ProfileOverlay, ProfileRegistry,
};
