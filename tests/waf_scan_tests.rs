//! Integration test for the WAF/CDN scan orchestrator (spec.md §4.9):
//! passive pass, active pass when attack headers are supplied, and the
//! ≤10-path batch cap (spec.md §4.8), end to end against an unroutable
//! target.

use reconsage::api::types::{ApiResult, WafScanRequest};
use reconsage::orchestrate::waf_scan;
use serial_test::serial;
use std::collections::BTreeMap;

fn paths(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("/p{i}")).collect()
}

#[tokio::test]
#[serial]
async fn waf_scan_truncates_wordlist_over_ten_paths() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("LOG_DIR", tmp.path());

    let req = WafScanRequest {
        target: "http://127.0.0.1:1".to_string(),
        wordlist: paths(15),
        json_file_name: "waf_scan.json".to_string(),
        json_file_path: Some("waf_scan_run".to_string()),
        concurrency: 100,
        timeout: 2,
        attack_headers: None,
    };

    match waf_scan::run(req).await {
        ApiResult::Ok { data } => {
            assert_eq!(data.paths_probed, 10);
            assert!(data.paths_truncated);
            assert!(data.report_path.exists());
        }
        ApiResult::Err { error } => panic!("expected Ok, got error: {error}"),
    }
}

#[tokio::test]
#[serial]
async fn waf_scan_runs_active_pass_only_when_attack_headers_supplied() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("LOG_DIR", tmp.path());

    let mut attack_headers = BTreeMap::new();
    attack_headers.insert("x-forwarded-for".to_string(), "127.0.0.1".to_string());

    let req = WafScanRequest {
        target: "http://127.0.0.1:1".to_string(),
        wordlist: paths(2),
        json_file_name: "waf_scan.json".to_string(),
        json_file_path: Some("waf_scan_run_active".to_string()),
        concurrency: 100,
        timeout: 2,
        attack_headers: Some(attack_headers),
    };

    match waf_scan::run(req).await {
        ApiResult::Ok { data } => {
            assert!(!data.paths_truncated);
            assert_eq!(data.paths_probed, 2);
        }
        ApiResult::Err { error } => panic!("expected Ok, got error: {error}"),
    }
}
