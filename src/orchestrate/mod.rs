//! C9 — Scan Orchestrators. One entry point per public operation,
//! each following the canonical pipeline from spec.md §4.9: warm-up →
//! Governor → main probe → analyze → persist → return summary.

pub mod directory_scan;
pub mod fp_scan;
pub mod ratelimit_scan;
pub mod waf_scan;

use crate::error::ReconResult;
use crate::governor::{self, GovernorBudget};
use crate::probe::record::ProbeRecord;
use crate::probe::Prober;

/// Shared warm-up-then-govern step used by every orchestrator that
/// takes caller-supplied seed paths (spec.md §4.9 step 1-2). Returns
/// the derived budget and the warm-up records themselves, since a
/// caller may want to report on them too.
pub(crate) async fn warmup_and_govern(
    target: &str,
    seed_paths: &[String],
    default_concurrency: u16,
    default_timeout_secs: u64,
) -> ReconResult<(GovernorBudget, Vec<ProbeRecord>)> {
    let warmup_prober = Prober::new(default_concurrency as usize, default_timeout_secs)
        .map_err(|e| crate::error::ReconError::Transport(e.to_string()))?;
    let warmup_records = warmup_prober.scan_batch(target, seed_paths, None, None).await;
    let budget = governor::compute_budget(&warmup_records, default_concurrency, default_timeout_secs)?;
    Ok((budget, warmup_records))
}

pub(crate) fn take_up_to(paths: &[String], n: usize) -> Vec<String> {
    paths.iter().take(n).cloned().collect()
}
