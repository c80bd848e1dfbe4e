//! `apply`: annotate a report file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use mmo_core::config::{CliOverrides, MmoConfig};
use mmo_core::errors::GateError;
use mmo_gates::{GateEngine, Report};
use tracing::info;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Input report (JSON)
    #[arg(long)]
    pub report: PathBuf,

    /// Where to write the annotated report
    #[arg(long)]
    pub out: PathBuf,

    /// Gate policy document
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Authority profile registry
    #[arg(long)]
    pub profiles: Option<PathBuf>,

    /// Authority profile to apply
    #[arg(long)]
    pub profile: Option<String>,

    /// Recommendation id approved for this run (repeatable)
    #[arg(long = "approve", value_name = "REC_ID")]
    pub approvals: Vec<String>,

    /// Evaluate recommendations on the current thread only
    #[arg(long)]
    pub sequential: bool,
}

impl ApplyArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            policy_path: self.policy.clone(),
            profiles_path: self.profiles.clone(),
            profile_id: self.profile.clone(),
            approvals: self.approvals.clone(),
            sequential: self.sequential,
        }
    }
}

pub fn run(root: &Path, args: &ApplyArgs) -> Result<()> {
    let config = MmoConfig::load(root, Some(&args.overrides())).map_err(GateError::from)?;

    // Policy and profile are loaded before the report is read, so a bad
    // document never leaves a partially written output behind.
    let engine = GateEngine::from_config(&config.gates, root)?;
    let mut report = read_report(&args.report)?;
    let summary = engine.annotate_report(&mut report);
    write_report(&args.out, &report)?;

    info!(
        out = %args.out.display(),
        recommendation_count = summary.recommendations,
        "wrote annotated report"
    );
    println!(
        "{} recommendations: {} auto_apply eligible, {} render eligible, {} blocked",
        summary.recommendations,
        summary.auto_apply_eligible,
        summary.render_eligible,
        summary.blocked
    );
    Ok(())
}

fn read_report(path: &Path) -> Result<Report, GateError> {
    let content = fs::read_to_string(path).map_err(|e| report_error(path, e))?;
    Report::from_json_str(&content).map_err(|e| report_error(path, e))
}

fn write_report(path: &Path, report: &Report) -> Result<(), GateError> {
    let json = report.to_canonical_json().map_err(|e| report_error(path, e))?;
    fs::write(path, json).map_err(|e| report_error(path, e))
}

fn report_error(path: &Path, err: impl std::fmt::Display) -> GateError {
    GateError::Report {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
