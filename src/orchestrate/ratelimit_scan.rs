//! Rate-limit scan orchestrator: `POST /rate/limit` (spec.md §6).
//! `domains` are the warm-up seed paths fed straight to the Governor
//! (which enforces the ≤5 warm-up cap itself, spec.md §4.4); `user_paths`
//! are the main batch. As with the WAF orchestrator, the passive
//! sub-pass runs first and never carries `attack_headers`.

use crate::analyze::ratelimit::{self, RateLimitVerdict};
use crate::api::types::{ApiResult, RateLimitScanRequest};
use crate::error::ReconResult;
use crate::governor;
use crate::probe::Prober;
use crate::sink;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitReport {
    pub passive: RateLimitVerdict,
    pub active: Option<RateLimitVerdict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitScanSummary {
    pub target: String,
    pub paths_probed: usize,
    pub rate_limited: bool,
    pub derived_concurrency: u16,
    pub derived_timeout_secs: u64,
    pub warning: Option<String>,
    pub fatal: Option<String>,
    pub report_path: PathBuf,
}

pub async fn run(req: RateLimitScanRequest) -> ApiResult<RateLimitScanSummary> {
    match run_inner(req).await {
        Ok(summary) => ApiResult::ok(summary),
        Err(e) => ApiResult::err(e),
    }
}

async fn run_inner(req: RateLimitScanRequest) -> ReconResult<RateLimitScanSummary> {
    let warmup_prober = Prober::new(req.concurrency as usize, req.timeout)
        .map_err(|e| crate::error::ReconError::Transport(e.to_string()))?;
    let warmup_records = warmup_prober.scan_batch(&req.target, &req.domains, None, None).await;
    let budget = governor::compute_budget(&warmup_records, req.concurrency, req.timeout)?;

    let prober = Prober::new(budget.concurrency as usize, budget.timeout_secs)
        .map_err(|e| crate::error::ReconError::Transport(e.to_string()))?;

    let passive_records = prober.scan_batch(&req.target, &req.user_paths, None, None).await;
    let passive = ratelimit::detect(&passive_records);

    let active = if let Some(attack_headers) = &req.attack_headers {
        let active_records =
            prober.scan_batch(&req.target, &req.user_paths, Some(attack_headers), None).await;
        Some(ratelimit::detect(&active_records))
    } else {
        None
    };

    let rate_limited = passive.rate_limited || active.as_ref().map(|a| a.rate_limited).unwrap_or(false);
    let report = RateLimitReport { passive, active };

    let folder_hint = req.json_file_path.unwrap_or_else(|| "ratelimit_scans".to_string());
    let report_path = sink::write(&folder_hint, &req.json_file_name, &report)?;

    Ok(RateLimitScanSummary {
        target: req.target,
        paths_probed: req.user_paths.len(),
        rate_limited,
        derived_concurrency: budget.concurrency,
        derived_timeout_secs: budget.timeout_secs,
        warning: budget.warning,
        fatal: budget.fatal,
        report_path,
    })
}
