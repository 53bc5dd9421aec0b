//! C5 — Directory Classifier. Partitions a probe batch into exactly
//! one of five status-class buckets (spec.md §4.5).

use crate::probe::record::ProbeRecord;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct UrlDetail {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body_sha256: String,
    pub content_length: usize,
    pub latency_ms: Option<f64>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct DirectoryReport {
    pub success: Vec<String>,
    pub redirect: Vec<String>,
    pub client_error: Vec<String>,
    pub server_error: Vec<String>,
    pub exception: Vec<String>,
    pub per_url: BTreeMap<String, UrlDetail>,
}

/// Classify `records` into exactly one bucket each, by status class.
/// `status == 0` (a transport failure) is the `exception` bucket.
pub fn classify(records: &[ProbeRecord]) -> DirectoryReport {
    let mut report = DirectoryReport::default();

    for record in records {
        let status = record.status_code;
        let bucket = if status == 0 {
            &mut report.exception
        } else if (200..300).contains(&status) {
            &mut report.success
        } else if (300..400).contains(&status) {
            &mut report.redirect
        } else if (400..500).contains(&status) {
            &mut report.client_error
        } else {
            &mut report.server_error
        };
        bucket.push(record.url.clone());

        report.per_url.insert(
            record.url.clone(),
            UrlDetail {
                status: record.status_code,
                headers: record.headers.clone(),
                body_sha256: record.body_sha256.clone(),
                content_length: record.content_length,
                latency_ms: record.latency_ms,
                timestamp: record.timestamp.clone(),
            },
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(url: &str, status: u16) -> ProbeRecord {
        ProbeRecord::success(url.to_string(), status, BTreeMap::new(), 1.0, Vec::new(), None)
    }

    #[test]
    fn every_url_lands_in_exactly_one_bucket() {
        let records = vec![
            record("https://h/a", 200),
            record("https://h/b", 301),
            record("https://h/c", 404),
            record("https://h/d", 500),
            ProbeRecord::failure("https://h/e".to_string(), "timeout".to_string()),
        ];
        let report = classify(&records);

        assert_eq!(report.success, vec!["https://h/a"]);
        assert_eq!(report.redirect, vec!["https://h/b"]);
        assert_eq!(report.client_error, vec!["https://h/c"]);
        assert_eq!(report.server_error, vec!["https://h/d"]);
        assert_eq!(report.exception, vec!["https://h/e"]);
        assert_eq!(report.per_url.len(), 5);
    }

    #[test]
    fn boundary_statuses_fall_on_the_correct_side() {
        let records = vec![record("https://h/200", 200), record("https://h/299", 299)];
        let report = classify(&records);
        assert_eq!(report.success.len(), 2);

        let boundary = vec![record("https://h/300", 300), record("https://h/399", 399)];
        let report = classify(&boundary);
        assert_eq!(report.redirect.len(), 2);
    }
}
