//! C6 — False-Positive Clusterer (spec.md §4.6). Groups successful
//! probe responses by identical body hash and by identical content
//! length to surface likely false positives (custom error pages served
//! with `200`, boilerplate "not found" bodies, etc).
//!
//! Grounded in `original_source/core_scanner/false_limit_detection.py`
//! for the canonical thresholds (hash cluster `>= 3`, equivalently
//! spec.md's `> 2`; length cluster `>= 5`) and the small/large/verified
//! length bands.

use crate::error::{ReconError, ReconResult};
use crate::probe::record::ProbeRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

const HASH_CLUSTER_THRESHOLD: usize = 3;
const SMALL_RESPONSE_BYTES: usize = 100;
const LARGE_RESPONSE_BYTES: usize = 50_000;
const VERIFIED_MIN_CLUSTER: usize = 3;
const VERIFIED_MAX_CLUSTER: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct FpUrl {
    pub url: String,
    pub reason: String,
    pub content_length: usize,
    pub confidence: &'static str,
    pub pattern_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct FalsePositiveReport {
    pub fp_urls: Vec<FpUrl>,
    pub verified_urls: Vec<FpUrl>,
    pub fp_ratio: f64,
    pub warning: Option<String>,
}

struct Entry {
    url: String,
    body_sha256: String,
    content_length: usize,
}

/// Insertion-order-preserving multimap: key -> ordered list of URLs.
fn group_by<K: std::hash::Hash + Eq + Clone>(
    entries: &[Entry],
    key_of: impl Fn(&Entry) -> K,
) -> Vec<(K, Vec<String>)> {
    let mut order: Vec<K> = Vec::new();
    let mut map: HashMap<K, Vec<String>> = HashMap::new();
    for entry in entries {
        let key = key_of(entry);
        map.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Vec::new()
        });
        map.get_mut(&key).unwrap().push(entry.url.clone());
    }
    order.into_iter().map(|k| { let v = map.remove(&k).unwrap(); (k, v) }).collect()
}

fn cluster(entries: &[Entry]) -> FalsePositiveReport {
    if entries.is_empty() {
        return FalsePositiveReport::default();
    }

    let by_hash = group_by(entries, |e| e.body_sha256.clone());
    let by_len = group_by(entries, |e| e.content_length);

    let length_of: HashMap<&str, usize> =
        entries.iter().map(|e| (e.url.as_str(), e.content_length)).collect();

    let mut fp_urls = Vec::new();
    let mut verified_urls = Vec::new();
    let mut flagged_urls = std::collections::HashSet::new();

    for (_, urls) in &by_hash {
        if urls.len() >= HASH_CLUSTER_THRESHOLD {
            for url in urls {
                let content_length = *length_of.get(url.as_str()).unwrap_or(&0);
                fp_urls.push(FpUrl {
                    url: url.clone(),
                    reason: "duplicate_response_body".to_string(),
                    content_length,
                    confidence: "medium",
                    pattern_count: Some(urls.len()),
                });
                flagged_urls.insert(url.clone());
            }
        }
    }

    for (length, urls) in &by_len {
        let length = *length;
        if length < SMALL_RESPONSE_BYTES {
            for url in urls {
                if flagged_urls.contains(url) {
                    continue;
                }
                fp_urls.push(FpUrl {
                    url: url.clone(),
                    reason: "suspiciously_small_response".to_string(),
                    content_length: length,
                    confidence: "low",
                    pattern_count: Some(urls.len()),
                });
                flagged_urls.insert(url.clone());
            }
        } else if length > LARGE_RESPONSE_BYTES {
            for url in urls {
                if flagged_urls.contains(url) {
                    continue;
                }
                fp_urls.push(FpUrl {
                    url: url.clone(),
                    reason: "suspiciously_large_response".to_string(),
                    content_length: length,
                    confidence: "low",
                    pattern_count: Some(urls.len()),
                });
                flagged_urls.insert(url.clone());
            }
        } else if (VERIFIED_MIN_CLUSTER..=VERIFIED_MAX_CLUSTER).contains(&urls.len()) {
            for url in urls {
                if flagged_urls.contains(url) {
                    continue;
                }
                verified_urls.push(FpUrl {
                    url: url.clone(),
                    reason: "verified".to_string(),
                    content_length: length,
                    confidence: "high",
                    pattern_count: Some(urls.len()),
                });
            }
        }
    }

    // Every URL lands in exactly one of fp_urls/verified_urls (spec.md §8
    // partition invariant): a URL whose cluster sizes/lengths trip none of
    // the bands above still needs a home, so it defaults to verified with
    // no particular signal behind it.
    let verified_set: std::collections::HashSet<&str> =
        verified_urls.iter().map(|f| f.url.as_str()).collect();
    for entry in entries {
        if flagged_urls.contains(&entry.url) || verified_set.contains(entry.url.as_str()) {
            continue;
        }
        verified_urls.push(FpUrl {
            url: entry.url.clone(),
            reason: "no_fp_signal".to_string(),
            content_length: entry.content_length,
            confidence: "medium",
            pattern_count: None,
        });
    }

    let total = entries.len() as f64;
    let fp_ratio = if total > 0.0 { flagged_urls.len() as f64 / total } else { 0.0 };
    let warning = if fp_ratio > 0.7 {
        Some("very high false-positive ratio".to_string())
    } else if fp_ratio > 0.5 {
        Some("high false-positive ratio".to_string())
    } else {
        None
    };

    FalsePositiveReport { fp_urls, verified_urls, fp_ratio, warning }
}

/// Cluster a live batch of successful Probe Records.
pub fn analyze_records(records: &[ProbeRecord]) -> FalsePositiveReport {
    let entries: Vec<Entry> = records
        .iter()
        .filter(|r| r.success)
        .map(|r| Entry {
            url: r.url.clone(),
            body_sha256: r.body_sha256.clone(),
            content_length: r.content_length,
        })
        .collect();
    cluster(&entries)
}

/// Cluster the `success` URLs of a previously-written directory scan
/// report on disk. Expects a JSON object with a `success` array of
/// URLs and a `per_url` map keyed by URL with `body_sha256` and
/// `content_length` fields, matching `analyze::directory::DirectoryReport`.
pub fn analyze_report_file(path: &Path) -> ReconResult<FalsePositiveReport> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| ReconError::Analysis(format!("report is not valid JSON: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| ReconError::Analysis("report is not a JSON object".to_string()))?;

    let success = obj
        .get("success")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ReconError::Analysis("report is missing a `success` array".to_string()))?;

    let per_url = obj
        .get("per_url")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ReconError::Analysis("report is missing a `per_url` object".to_string()))?;

    let mut entries = Vec::with_capacity(success.len());
    for url_value in success {
        let url = url_value
            .as_str()
            .ok_or_else(|| ReconError::Analysis("`success` entry is not a string".to_string()))?;
        let detail = per_url
            .get(url)
            .and_then(|v| v.as_object())
            .ok_or_else(|| ReconError::Analysis(format!("`per_url` is missing entry for {url}")))?;
        let body_sha256 = detail
            .get("body_sha256")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let content_length = detail
            .get("content_length")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;
        entries.push(Entry { url: url.to_string(), body_sha256, content_length });
    }

    Ok(cluster(&entries))
}
