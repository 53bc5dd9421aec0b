//! WAF/CDN scan orchestrator: `POST /waf/scan` (spec.md §6). Runs a
//! passive sub-pass (plain requests) and, when the caller supplies
//! `attack_headers`, an active sub-pass with those headers attached.
//! The passive pass never modifies request headers (spec.md §4.9).

use super::{take_up_to, warmup_and_govern};
use crate::analyze::fingerprint::{self, FingerprintReport};
use crate::api::types::{ApiResult, WafScanRequest};
use crate::error::ReconResult;
use crate::probe::Prober;
use crate::sink;
use serde::Serialize;
use std::path::PathBuf;

const WAF_BATCH_CAP: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct UrlFingerprint {
    pub url: String,
    pub fingerprint: FingerprintReport,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct WafReport {
    pub passive: Vec<UrlFingerprint>,
    pub active: Vec<UrlFingerprint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WafScanSummary {
    pub target: String,
    pub paths_probed: usize,
    pub paths_truncated: bool,
    pub vendors_detected: Vec<&'static str>,
    pub derived_concurrency: u16,
    pub derived_timeout_secs: u64,
    pub report_path: PathBuf,
}

pub async fn run(req: WafScanRequest) -> ApiResult<WafScanSummary> {
    match run_inner(req).await {
        Ok(summary) => ApiResult::ok(summary),
        Err(e) => ApiResult::err(e),
    }
}

fn fingerprint_batch(urls_and_records: &[(String, crate::probe::record::ProbeRecord)]) -> Vec<UrlFingerprint> {
    urls_and_records
        .iter()
        .map(|(url, record)| UrlFingerprint { url: url.clone(), fingerprint: fingerprint::fingerprint(record) })
        .collect()
}

async fn run_inner(req: WafScanRequest) -> ReconResult<WafScanSummary> {
    let paths_truncated = req.wordlist.len() > WAF_BATCH_CAP;
    if paths_truncated {
        tracing::warn!(
            requested = req.wordlist.len(),
            cap = WAF_BATCH_CAP,
            "WAF scan wordlist exceeds the per-batch cap, truncating silently"
        );
    }
    let suffixes: Vec<String> = req.wordlist.into_iter().take(WAF_BATCH_CAP).collect();

    let seed_paths = take_up_to(&suffixes, 5);
    let (budget, _warmup) =
        warmup_and_govern(&req.target, &seed_paths, req.concurrency, req.timeout).await?;

    let prober = Prober::new(budget.concurrency as usize, budget.timeout_secs)
        .map_err(|e| crate::error::ReconError::Transport(e.to_string()))?;

    let passive_records = prober.scan_batch(&req.target, &suffixes, None, None).await;
    let passive: Vec<(String, crate::probe::record::ProbeRecord)> =
        passive_records.into_iter().map(|r| (r.url.clone(), r)).collect();
    let passive_fingerprints = fingerprint_batch(&passive);

    let active_fingerprints = if let Some(attack_headers) = &req.attack_headers {
        let active_records = prober.scan_batch(&req.target, &suffixes, Some(attack_headers), None).await;
        let active: Vec<(String, crate::probe::record::ProbeRecord)> =
            active_records.into_iter().map(|r| (r.url.clone(), r)).collect();
        fingerprint_batch(&active)
    } else {
        Vec::new()
    };

    let mut vendors_detected: Vec<&'static str> = passive_fingerprints
        .iter()
        .chain(active_fingerprints.iter())
        .flat_map(|uf| uf.fingerprint.detections.iter().map(|d| d.vendor))
        .collect();
    vendors_detected.sort_unstable();
    vendors_detected.dedup();

    let report = WafReport { passive: passive_fingerprints, active: active_fingerprints };

    let folder_hint = req.json_file_path.unwrap_or_else(|| "waf_scans".to_string());
    let report_path = sink::write(&folder_hint, &req.json_file_name, &report)?;

    Ok(WafScanSummary {
        target: req.target,
        paths_probed: suffixes.len(),
        paths_truncated,
        vendors_detected,
        derived_concurrency: budget.concurrency,
        derived_timeout_secs: budget.timeout_secs,
        report_path,
    })
}
