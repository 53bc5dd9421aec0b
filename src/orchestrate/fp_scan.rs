//! False-positive analysis orchestrator: `POST /false/positive`
//! (spec.md §6). Two entry points to the same clustering logic
//! (spec.md §9): `json_file_to_read` re-clusters a previously-written
//! directory-scan report; `list_of_targets` re-probes a live URL list.
//! Exactly one of the two must be supplied.

use crate::analyze::falsepositive::{self, FalsePositiveReport};
use crate::api::types::{ApiResult, FalsePositiveRequest};
use crate::error::{ReconError, ReconResult};
use crate::probe::Prober;
use crate::sink;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct FalsePositiveSummary {
    pub source: &'static str,
    pub fp_count: usize,
    pub verified_count: usize,
    pub fp_ratio: f64,
    pub warning: Option<String>,
    pub report_path: PathBuf,
}

pub async fn run(req: FalsePositiveRequest) -> ApiResult<FalsePositiveSummary> {
    match run_inner(req).await {
        Ok(summary) => ApiResult::ok(summary),
        Err(e) => ApiResult::err(e),
    }
}

async fn run_inner(req: FalsePositiveRequest) -> ReconResult<FalsePositiveSummary> {
    let (report, source): (FalsePositiveReport, &'static str) =
        match (&req.json_file_to_read, &req.list_of_targets) {
            (Some(path), _) => (falsepositive::analyze_report_file(Path::new(path))?, "report_file"),
            (None, Some(urls)) => {
                let prober = Prober::new(req.concurrency as usize, req.timeout)
                    .map_err(|e| ReconError::Transport(e.to_string()))?;
                let records = prober.probe_urls(urls).await;
                (falsepositive::analyze_records(&records), "live_reprobe")
            }
            (None, None) => {
                return Err(ReconError::Config(
                    "false-positive analysis requires either json_file_to_read or list_of_targets"
                        .to_string(),
                ))
            }
        };

    let folder_hint = req.json_full_path.unwrap_or_else(|| "fp_analysis".to_string());
    let report_path = sink::write(&folder_hint, &req.json_file_name, &report)?;

    Ok(FalsePositiveSummary {
        source,
        fp_count: report.fp_urls.len(),
        verified_count: report.verified_urls.len(),
        fp_ratio: report.fp_ratio,
        warning: report.warning,
        report_path,
    })
}
