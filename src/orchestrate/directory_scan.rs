//! Directory scan orchestrator: `POST /scan` (spec.md §6).

use super::{take_up_to, warmup_and_govern};
use crate::analyze::directory::{self, DirectoryReport};
use crate::api::types::{ApiResult, DirectoryScanRequest};
use crate::error::ReconResult;
use crate::probe::Prober;
use crate::{sink, wordlist};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryScanSummary {
    pub target: String,
    pub total_probed: usize,
    pub success_count: usize,
    pub redirect_count: usize,
    pub client_error_count: usize,
    pub server_error_count: usize,
    pub exception_count: usize,
    pub derived_concurrency: u16,
    pub derived_timeout_secs: u64,
    pub warning: Option<String>,
    pub fatal: Option<String>,
    pub report_path: PathBuf,
}

pub async fn run(req: DirectoryScanRequest) -> ApiResult<DirectoryScanSummary> {
    match run_inner(req).await {
        Ok(summary) => ApiResult::ok(summary),
        Err(e) => ApiResult::err(e),
    }
}

async fn run_inner(req: DirectoryScanRequest) -> ReconResult<DirectoryScanSummary> {
    let primary = wordlist::load(&req.wordlist);
    let suffixes = match req.wordlist_2 {
        Some(path) => wordlist::combine(primary, wordlist::load(&path)),
        None => primary,
    };

    let seed_paths = take_up_to(&suffixes, 5);
    let (budget, _warmup) =
        warmup_and_govern(&req.target, &seed_paths, req.concurrency, req.timeout).await?;

    let prober = Prober::new(budget.concurrency as usize, budget.timeout_secs)
        .map_err(|e| crate::error::ReconError::Transport(e.to_string()))?;
    let records = prober.scan_batch(&req.target, &suffixes, None, None).await;

    let report: DirectoryReport = directory::classify(&records);

    let folder_hint = req.json_file_path.unwrap_or_else(|| "directory_scans".to_string());
    let report_path = sink::write(&folder_hint, &req.json_file_name, &report)?;

    Ok(DirectoryScanSummary {
        target: req.target,
        total_probed: records.len(),
        success_count: report.success.len(),
        redirect_count: report.redirect.len(),
        client_error_count: report.client_error.len(),
        server_error_count: report.server_error.len(),
        exception_count: report.exception.len(),
        derived_concurrency: budget.concurrency,
        derived_timeout_secs: budget.timeout_secs,
        warning: budget.warning,
        fatal: budget.fatal,
        report_path,
    })
}
