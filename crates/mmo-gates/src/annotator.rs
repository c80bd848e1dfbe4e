//! Report annotation: `GateEngine` and the `apply_gates` entry point.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use mmo_core::config::GateConfig;
use mmo_core::constants::PARALLEL_RECOMMENDATION_THRESHOLD;
use mmo_core::errors::GateError;
use mmo_core::events::{
    EventDispatcher, GateFiredEvent, PolicyLoadedEvent, ProfileResolvedEvent, ReportAnnotatedEvent,
};

use crate::eligibility::Eligibility;
use crate::evaluator::{GateEvaluator, GateResult};
use crate::model::{Recommendation, Report};
use crate::policy::{load_gate_policy, GatePolicy};
use crate::profile::{resolve_profile, ProfileOverlay};

/// Per-report counts, for logs and CLI output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilitySummary {
    pub profile_id: Option<String>,
    pub recommendations: usize,
    pub auto_apply_eligible: usize,
    pub render_eligible: usize,
    /// Eligible for neither auto-apply nor render.
    pub blocked: usize,
    pub gate_results: usize,
}

impl EligibilitySummary {
    fn record(&mut self, eligibility: Eligibility, result_count: usize) {
        self.recommendations += 1;
        self.gate_results += result_count;
        if eligibility.auto_apply {
            self.auto_apply_eligible += 1;
        }
        if eligibility.render {
            self.render_eligible += 1;
        }
        if !eligibility.auto_apply && !eligibility.render {
            self.blocked += 1;
        }
    }
}

/// A loaded policy plus a resolved overlay, ready to annotate any number of
/// reports. Immutable once built; share it by reference across threads.
#[derive(Debug, Clone)]
pub struct GateEngine {
    policy: GatePolicy,
    overlay: ProfileOverlay,
    approvals: BTreeSet<String>,
    parallel: bool,
    events: EventDispatcher,
}

impl GateEngine {
    pub fn new(policy: GatePolicy, overlay: ProfileOverlay) -> Self {
        for gate_id in overlay.unknown_override_targets(&policy) {
            warn!(
                profile_id = overlay.profile_id().unwrap_or_default(),
                %gate_id,
                "profile overrides a gate the policy does not define; ignoring"
            );
        }
        Self {
            policy,
            overlay,
            approvals: BTreeSet::new(),
            parallel: true,
            events: EventDispatcher::new(),
        }
    }

    /// Load the policy and resolve the profile. Both documents are read and
    /// validated before any report is touched.
    pub fn load(
        policy_path: &Path,
        profile_id: Option<&str>,
        profiles_path: Option<&Path>,
    ) -> Result<Self, GateError> {
        let policy = load_gate_policy(policy_path)?;
        let overlay = resolve_profile(profiles_path, profile_id)?;
        Ok(Self::new(policy, overlay))
    }

    /// Build from resolved configuration, with relative paths taken from `root`.
    pub fn from_config(config: &GateConfig, root: &Path) -> Result<Self, GateError> {
        let policy_path = config.effective_policy_path(root);
        let profiles_path = config.effective_profiles_path(root);
        let engine = Self::load(&policy_path, config.profile_id.as_deref(), Some(profiles_path.as_path()))?
            .with_approvals(config.approvals.iter().cloned())
            .with_parallel(config.effective_parallel());
        Ok(engine)
    }

    /// Recommendation ids approved out of band; they clear approval gates.
    pub fn with_approvals<I>(mut self, approvals: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.approvals = approvals.into_iter().collect();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Attach event handlers. Announces the loaded policy and profile to them.
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        events.emit_policy_loaded(&PolicyLoadedEvent {
            path: self.policy.source().map(Path::to_path_buf).unwrap_or_default(),
            schema_version: self.policy.schema_version().to_string(),
            gate_count: self.policy.len(),
        });
        events.emit_profile_resolved(&ProfileResolvedEvent {
            profile_id: self.overlay.profile_id().map(str::to_string),
            disabled_contexts: self
                .overlay
                .profile()
                .map(|p| p.disabled_contexts.iter().map(|c| c.as_str().to_string()).collect())
                .unwrap_or_default(),
            override_count: self.overlay.profile().map_or(0, |p| p.gate_overrides.len()),
        });
        self.events = events;
        self
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub fn overlay(&self) -> &ProfileOverlay {
        &self.overlay
    }

    pub fn approvals(&self) -> &BTreeSet<String> {
        &self.approvals
    }

    fn evaluator(&self) -> GateEvaluator<'_> {
        GateEvaluator::new(&self.policy, &self.overlay, &self.approvals)
    }

    /// Evaluate one recommendation without modifying it.
    pub fn evaluate(&self, rec: &Recommendation) -> (Vec<GateResult>, Eligibility) {
        let results = self.evaluator().evaluate(rec);
        let eligibility = Eligibility::from_results(&results);
        (results, eligibility)
    }

    /// Annotate every recommendation of `report` in place.
    ///
    /// `gate_results`, `eligible_auto_apply` and `eligible_render` are
    /// recomputed from scratch, so running twice gives the same report.
    pub fn annotate_report(&self, report: &mut Report) -> EligibilitySummary {
        let start = Instant::now();

        let verdicts: Vec<(Vec<GateResult>, Eligibility)> =
            if self.parallel && report.recommendations.len() >= PARALLEL_RECOMMENDATION_THRESHOLD {
                report
                    .recommendations
                    .par_iter()
                    .map(|rec| self.evaluate(rec))
                    .collect()
            } else {
                report.recommendations.iter().map(|rec| self.evaluate(rec)).collect()
            };

        let mut summary = EligibilitySummary {
            profile_id: self.overlay.profile_id().map(str::to_string),
            ..EligibilitySummary::default()
        };
        for (rec, (results, eligibility)) in report.recommendations.iter_mut().zip(verdicts) {
            if !self.events.is_empty() {
                for result in &results {
                    self.events.emit_gate_fired(&GateFiredEvent {
                        recommendation_id: rec.recommendation_id.clone(),
                        gate_id: result.gate_id.clone(),
                        context: result.context.as_str().to_string(),
                        outcome: result.outcome.as_str().to_string(),
                        reason_id: result.reason_id.clone(),
                    });
                }
            }
            summary.record(eligibility, results.len());
            rec.gate_results = results.iter().map(GateResult::to_record).collect();
            rec.eligible_auto_apply = Some(eligibility.auto_apply);
            rec.eligible_render = Some(eligibility.render);
        }

        report.profile_id = summary.profile_id.clone();

        let duration_ms = start.elapsed().as_millis() as u64;
        // Field names match `mmo_core::tracing::metrics`.
        info!(
            profile_id = summary.profile_id.as_deref().unwrap_or(""),
            recommendation_count = summary.recommendations,
            gate_result_count = summary.gate_results,
            auto_apply_eligible = summary.auto_apply_eligible,
            render_eligible = summary.render_eligible,
            gate_evaluation_time = duration_ms,
            "annotated report"
        );
        self.events.emit_report_annotated(&ReportAnnotatedEvent {
            profile_id: summary.profile_id.clone(),
            recommendation_count: summary.recommendations,
            auto_apply_eligible: summary.auto_apply_eligible,
            render_eligible: summary.render_eligible,
            duration_ms,
        });
        summary
    }

    /// Annotate independent reports, in parallel when enabled. Summaries are
    /// returned in input order.
    pub fn annotate_reports(&self, reports: &mut [Report]) -> Vec<EligibilitySummary> {
        debug!(report_count = reports.len(), parallel = self.parallel, "annotating reports");
        if self.parallel {
            reports
                .par_iter_mut()
                .map(|report| self.annotate_report(report))
                .collect()
        } else {
            reports
                .iter_mut()
                .map(|report| self.annotate_report(report))
                .collect()
        }
    }
}

/// Load the policy (and profile, when requested) and annotate `report`.
///
/// Fails before the report is modified if either document is missing or
/// malformed, or if `profile_id` is not in the registry.
pub fn apply_gates(
    report: &mut Report,
    policy_path: &Path,
    profile_id: Option<&str>,
    profiles_path: Option<&Path>,
) -> Result<EligibilitySummary, GateError> {
    let engine = GateEngine::load(policy_path, profile_id, profiles_path)?;
    Ok(engine.annotate_report(report))
}
