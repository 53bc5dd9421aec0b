//! C4 — AIMD Governor.
//!
//! Converts a handful of warm-up Probe Records into a per-target
//! concurrency/timeout budget for the main scan. Update rule, clamp,
//! and advisory thresholds are taken from spec.md §4.4 and from
//! `original_source/core_scanner/aimd_currency_governor.py` (α = 10
//! additive step, β = 0.5 multiplicative backoff, β^1.5 on a 429,
//! clamp to [100, 200]).
//!
//! The update rule is applied as a running state that carries forward,
//! record by record, the clamped (concurrency, timeout) snapshot from
//! the previous record — mirroring the Python original's single
//! mutable `AIMDConcurrencyDataGather` instance, whose `self.*` fields
//! persist (post-clamp) across successive calls. The Governor's
//! returned budget is the median of the per-record snapshots produced
//! along that sequence, per spec.md §4.4's aggregation rule.

use crate::error::{ReconError, ReconResult};
use crate::probe::record::ProbeRecord;

pub const ALPHA: i64 = 10;
pub const BETA: f64 = 0.5;
pub const CONCURRENCY_FLOOR: i64 = 100;
pub const CONCURRENCY_CEILING: i64 = 200;
pub const WARMUP_MAX: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct GovernorBudget {
    pub concurrency: u16,
    pub timeout_secs: u64,
    pub warning: Option<String>,
    pub fatal: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    concurrency: i64,
    timeout: i64,
}

fn apply_update(status: u16, mut concurrency: i64, mut timeout: i64) -> Snapshot {
    if (200..300).contains(&status) {
        concurrency += ALPHA;
        timeout = (timeout - 1).max(1);
    } else if (400..600).contains(&status) {
        concurrency = (concurrency as f64 * BETA).floor() as i64;
        timeout += 10;
    }

    if status == 429 {
        concurrency = (concurrency as f64 * BETA.powf(1.5)).floor() as i64;
        timeout += 15;
    }

    concurrency = concurrency.clamp(CONCURRENCY_FLOOR, CONCURRENCY_CEILING);
    Snapshot { concurrency, timeout }
}

fn median_i64(mut values: Vec<i64>) -> i64 {
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2
    } else {
        values[mid]
    }
}

/// Compute the adjusted (concurrency, timeout) budget for the main
/// batch from a warm-up batch of Probe Records. Caller defaults pass
/// through unchanged when `warmup` is empty.
///
/// # Errors
/// Returns `ReconError::Config` if `warmup.len() > 5` (spec.md §4.4).
pub fn compute_budget(
    warmup: &[ProbeRecord],
    default_concurrency: u16,
    default_timeout_secs: u64,
) -> ReconResult<GovernorBudget> {
    if warmup.len() > WARMUP_MAX {
        return Err(ReconError::Config(format!(
            "warm-up batch of {} exceeds the {} path maximum",
            warmup.len(),
            WARMUP_MAX
        )));
    }

    if warmup.is_empty() {
        return Ok(GovernorBudget {
            concurrency: default_concurrency,
            timeout_secs: default_timeout_secs,
            warning: None,
            fatal: None,
        });
    }

    let mut state = Snapshot {
        concurrency: default_concurrency as i64,
        timeout: default_timeout_secs as i64,
    };
    let mut concurrencies = Vec::with_capacity(warmup.len());
    let mut timeouts = Vec::with_capacity(warmup.len());

    for record in warmup {
        state = apply_update(record.status_code, state.concurrency, state.timeout);
        concurrencies.push(state.concurrency);
        timeouts.push(state.timeout);
    }

    let concurrency = median_i64(concurrencies).clamp(CONCURRENCY_FLOOR, CONCURRENCY_CEILING);
    let timeout = median_i64(timeouts).max(1);

    let warning = if (10..30).contains(&concurrency) {
        Some("server is errorful, consider aborting".to_string())
    } else {
        None
    };
    let fatal = if concurrency < 5 {
        Some("server appears dead or hardened".to_string())
    } else {
        None
    };

    Ok(GovernorBudget {
        concurrency: concurrency as u16,
        timeout_secs: timeout as u64,
        warning,
        fatal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::record::ProbeRecord;

    fn record_with_status(status: u16) -> ProbeRecord {
        ProbeRecord::transport_failure_stub("https://h/x", "unused").with_status_for_test(status)
    }

    #[test]
    fn empty_warmup_passes_defaults_through() {
        let budget = compute_budget(&[], 42, 7).unwrap();
        assert_eq!(budget.concurrency, 42);
        assert_eq!(budget.timeout_secs, 7);
    }

    #[test]
    fn over_five_warmup_records_is_config_error() {
        let warmup: Vec<ProbeRecord> = (0..6).map(|_| record_with_status(200)).collect();
        let err = compute_budget(&warmup, 100, 10).unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
    }

    #[test]
    fn monotone_on_strict_2xx_warmup() {
        let warmup: Vec<ProbeRecord> = (0..5).map(|_| record_with_status(200)).collect();
        let budget = compute_budget(&warmup, 100, 10).unwrap();
        assert!(budget.concurrency >= 100);
        assert!(budget.timeout_secs <= 10);
        assert!(budget.concurrency <= CONCURRENCY_CEILING as u16);
    }

    #[test]
    fn monotone_on_strict_5xx_warmup() {
        let warmup: Vec<ProbeRecord> = (0..4).map(|_| record_with_status(500)).collect();
        let budget = compute_budget(&warmup, 100, 10).unwrap();
        // The clamp resets concurrency to the floor every step (scenario 6 of
        // spec.md §8), so the running state never escapes [100, 200] and no
        // fatal advisory fires despite the repeated halving.
        assert_eq!(budget.concurrency, 100);
        assert!(budget.timeout_secs >= 10);
        assert!(budget.fatal.is_none());
    }

    #[test]
    fn mixed_warmup_stays_within_clamp_bounds() {
        let statuses = [200u16, 200, 429, 500, 200];
        let warmup: Vec<ProbeRecord> = statuses.iter().map(|s| record_with_status(*s)).collect();
        let budget = compute_budget(&warmup, 100, 10).unwrap();
        assert!(budget.concurrency >= CONCURRENCY_FLOOR as u16);
        assert!(budget.concurrency <= CONCURRENCY_CEILING as u16);
        assert!(budget.timeout_secs >= 1);
    }
}
