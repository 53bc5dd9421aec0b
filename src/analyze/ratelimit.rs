//! C8 — Rate-Limit Detector (spec.md §4.8). Consumes a probe batch in
//! submission order and looks for six independent signals; the verdict
//! is `rate_limited = true` iff any signal fires. All raw evidence is
//! returned alongside the verdict so a report can be audited, per
//! spec.md §4.8's closing sentence.
//!
//! Grounded in `original_source/core_scanner/rate_limiting.py` for the
//! overall "probe a path list, inspect status/headers" shape; the
//! status-code set, latency statistics, and header signals are taken
//! verbatim from spec.md §4.8 since the Python original never finished
//! past issuing the requests.

use crate::probe::record::ProbeRecord;
use serde::Serialize;

/// Status codes spec.md §4.8 treats as rate-limit evidence, directly or
/// via a transition from a prior 2xx.
const RATE_LIMIT_STATUSES: &[u16] = &[
    400, 402, 403, 406, 419, 420, 429, 444, 450, 494, 499, 503, 509, 510, 521, 522, 523, 525, 526,
    530,
];
const SUCCESS_STATUSES: &[u16] = &[200, 201, 202, 205, 206];

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "evidence")]
pub enum Signal {
    StatusInRatelimitSet { urls: Vec<String> },
    SuccessToRatelimitTransition { transitions: Vec<(String, String)> },
    LatencySpike { spike_latencies_ms: Vec<f64>, median_ms: f64 },
    LatencyIncreasingTrend { up_score: i64, down_score: i64 },
    RetryAfterPresent { urls: Vec<String> },
    RemainingZero { urls: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RateLimitVerdict {
    pub rate_limited: bool,
    pub signals: Vec<Signal>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator); `values` must have at
/// least 2 elements.
fn stdev(values: &[f64], mean: f64) -> f64 {
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn parse_remaining_zero(value: &str) -> bool {
    value.trim().parse::<i64>().map(|n| n == 0).unwrap_or(false)
}

/// Detect rate-limiting signals in `records`, preserving the input
/// order for the transition/trend analyses (spec.md §5: analyzers see
/// a deterministic sequence given the same wordlist).
pub fn detect(records: &[ProbeRecord]) -> RateLimitVerdict {
    let mut signals = Vec::new();

    let status_hits: Vec<String> = records
        .iter()
        .filter(|r| RATE_LIMIT_STATUSES.contains(&r.status_code))
        .map(|r| r.url.clone())
        .collect();
    if !status_hits.is_empty() {
        signals.push(Signal::StatusInRatelimitSet { urls: status_hits });
    }

    let mut transitions = Vec::new();
    for window in records.windows(2) {
        let (prev, cur) = (&window[0], &window[1]);
        if SUCCESS_STATUSES.contains(&prev.status_code) && RATE_LIMIT_STATUSES.contains(&cur.status_code)
        {
            transitions.push((prev.url.clone(), cur.url.clone()));
        }
    }
    if !transitions.is_empty() {
        signals.push(Signal::SuccessToRatelimitTransition { transitions });
    }

    let latencies: Vec<f64> = records.iter().filter_map(|r| r.latency_ms).filter(|l| *l > 0.0).collect();
    if latencies.len() >= 3 {
        let mu = mean(&latencies);
        let sigma = stdev(&latencies, mu);
        let med = median(&latencies);
        let stdev_spikes: Vec<f64> =
            latencies.iter().copied().filter(|x| *x > mu + 3.0 * sigma).collect();
        let max_latency = latencies.iter().cloned().fold(f64::MIN, f64::max);
        let median_ratio_spike = med > 0.0 && max_latency > 4.0 * med;

        if stdev_spikes.len() >= 2 || median_ratio_spike {
            let spike_latencies_ms = if stdev_spikes.len() >= 2 {
                stdev_spikes
            } else {
                latencies.iter().copied().filter(|x| *x > 4.0 * med).collect()
            };
            signals.push(Signal::LatencySpike { spike_latencies_ms, median_ms: med });
        }

        let mut up_score = 0i64;
        let mut down_score = 0i64;
        for pair in latencies.windows(2) {
            if pair[1] > pair[0] {
                up_score += 10;
            } else {
                down_score += 10;
            }
        }
        // "up_score >> down_score" per spec.md §4.8: the trend signal
        // fires when the increasing count clearly dominates an actual
        // mix of ups and downs. A purely monotonic ramp (down_score=0)
        // has no contrasting signal to dominate over, so it's left to
        // the spike rules above rather than reported as a trend.
        if down_score > 0 && up_score >= down_score * 2 {
            signals.push(Signal::LatencyIncreasingTrend { up_score, down_score });
        }
    }

    let retry_after_urls: Vec<String> = records
        .iter()
        .filter(|r| r.headers.get("retry-after").is_some())
        .map(|r| r.url.clone())
        .collect();
    if !retry_after_urls.is_empty() {
        signals.push(Signal::RetryAfterPresent { urls: retry_after_urls });
    }

    let remaining_zero_urls: Vec<String> = records
        .iter()
        .filter(|r| r.headers.get("x-ratelimit-remaining").map(|v| parse_remaining_zero(v)).unwrap_or(false))
        .map(|r| r.url.clone())
        .collect();
    if !remaining_zero_urls.is_empty() {
        signals.push(Signal::RemainingZero { urls: remaining_zero_urls });
    }

    let rate_limited = !signals.is_empty();
    RateLimitVerdict { rate_limited, signals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(url: &str, status: u16, latency_ms: f64) -> ProbeRecord {
        let mut r = ProbeRecord::success(url.to_string(), status, BTreeMap::new(), latency_ms, Vec::new(), None);
        r.latency_ms = Some(latency_ms);
        r
    }

    #[test]
    fn retry_after_header_fires_its_own_signal() {
        let mut r2 = record("https://h/b", 200, 10.0);
        r2.headers.insert("retry-after".to_string(), "30".to_string());
        let records = vec![record("https://h/a", 200, 10.0), r2, record("https://h/c", 200, 10.0)];

        let verdict = detect(&records);
        assert!(verdict.rate_limited);
        assert_eq!(verdict.signals.len(), 1);
        assert!(matches!(verdict.signals[0], Signal::RetryAfterPresent { .. }));
    }

    #[test]
    fn direct_429_status_fires_status_signal() {
        let records = vec![record("https://h/a", 200, 10.0), record("https://h/b", 429, 10.0)];
        let verdict = detect(&records);
        assert!(verdict.rate_limited);
        assert!(verdict
            .signals
            .iter()
            .any(|s| matches!(s, Signal::StatusInRatelimitSet { .. })));
    }

    #[test]
    fn success_then_ratelimit_fires_transition_signal() {
        let records = vec![record("https://h/a", 200, 10.0), record("https://h/b", 503, 10.0)];
        let verdict = detect(&records);
        assert!(verdict
            .signals
            .iter()
            .any(|s| matches!(s, Signal::SuccessToRatelimitTransition { .. })));
    }

    #[test]
    fn remaining_zero_header_fires_its_own_signal() {
        let mut r = record("https://h/a", 200, 10.0);
        r.headers.insert("x-ratelimit-remaining".to_string(), "0".to_string());
        let verdict = detect(&[r]);
        assert!(verdict.signals.iter().any(|s| matches!(s, Signal::RemainingZero { .. })));
    }

    #[test]
    fn stable_low_latency_all_2xx_is_not_rate_limited() {
        let records: Vec<ProbeRecord> =
            (0..5).map(|i| record(&format!("https://h/{i}"), 200, 10.0 + i as f64)).collect();
        let verdict = detect(&records);
        assert!(!verdict.rate_limited);
    }

    #[test]
    fn latency_spike_via_median_ratio_rule() {
        let mut records: Vec<ProbeRecord> =
            (0..4).map(|i| record(&format!("https://h/{i}"), 200, 10.0)).collect();
        records.push(record("https://h/spike", 200, 500.0));
        let verdict = detect(&records);
        assert!(verdict.signals.iter().any(|s| matches!(s, Signal::LatencySpike { .. })));
    }

    #[test]
    fn empty_batch_is_not_rate_limited() {
        let verdict = detect(&[]);
        assert!(!verdict.rate_limited);
        assert!(verdict.signals.is_empty());
    }
}
