//! Eligibility: result ordering and the two eligibility flags.

use serde::{Deserialize, Serialize};

use crate::evaluator::GateResult;
use crate::model::GateResultRecord;
use crate::policy::Context;

/// Eligibility verdict for one recommendation.
///
/// Any result in a context disqualifies it, whether `reject` or
/// `suggest_only`. `suggest` results never affect either flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub auto_apply: bool,
    pub render: bool,
}

impl Eligibility {
    /// Combine from the contexts of the accumulated results.
    pub fn from_contexts<I>(contexts: I) -> Self
    where
        I: IntoIterator<Item = Context>,
    {
        let mut eligibility = Self {
            auto_apply: true,
            render: true,
        };
        for context in contexts {
            match context {
                Context::AutoApply => eligibility.auto_apply = false,
                Context::Render => eligibility.render = false,
                Context::Suggest => {}
            }
        }
        eligibility
    }

    pub fn from_results(results: &[GateResult]) -> Self {
        Self::from_contexts(results.iter().map(|r| r.context))
    }

    /// Recompute from already-serialized results, e.g. to verify a report.
    pub fn from_records(records: &[GateResultRecord]) -> Self {
        Self::from_contexts(records.iter().map(|r| r.context))
    }

    pub fn is_fully_eligible(&self) -> bool {
        self.auto_apply && self.render
    }
}

/// Sort results by `(context_rank, gate_id, reason_id)`. The sort is stable,
/// so equal keys keep their policy order.
pub fn sort_results(results: &mut [GateResult]) {
    results.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Whether serialized results are in canonical order.
pub fn is_canonically_ordered(records: &[GateResultRecord]) -> bool {
    records.windows(2).all(|w| {
        (w[0].context, &w[0].gate_id, &w[0].reason_id) <= (w[1].context, &w[1].gate_id, &w[1].reason_id)
    })
}
