//! Integration test for the directory scan orchestrator (spec.md §4.9):
//! warm-up -> Governor -> Prober -> Classifier -> Sink, end to end
//! against an unroutable target so every probe deterministically
//! transport-fails into the `exception` bucket without real network I/O.

use reconsage::api::types::{ApiResult, DirectoryScanRequest};
use reconsage::orchestrate::directory_scan;
use serial_test::serial;
use std::io::Write;

fn wordlist_fixture(dir: &std::path::Path, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join("wordlist.txt");
    let mut f = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
    path
}

#[tokio::test]
#[serial]
async fn directory_scan_against_unroutable_target_lands_everything_in_exception() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("LOG_DIR", tmp.path());
    let wordlist = wordlist_fixture(tmp.path(), &["admin", "login", "backup"]);

    let req = DirectoryScanRequest {
        target: "http://127.0.0.1:1".to_string(),
        wordlist: wordlist.to_string_lossy().to_string(),
        wordlist_2: None,
        json_file_path: Some("dir_scan_run".to_string()),
        json_file_name: "directory_scan.json".to_string(),
        concurrency: 100,
        timeout: 2,
    };

    match directory_scan::run(req).await {
        ApiResult::Ok { data } => {
            assert_eq!(data.total_probed, 3);
            assert_eq!(data.exception_count, 3);
            assert_eq!(data.success_count, 0);
            assert!(data.report_path.exists());
        }
        ApiResult::Err { error } => panic!("expected Ok, got error: {error}"),
    }
}

#[tokio::test]
#[serial]
async fn directory_scan_combines_two_wordlists_without_deduplication() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("LOG_DIR", tmp.path());
    let primary = wordlist_fixture(tmp.path(), &["admin", "login"]);
    let secondary_dir = tmp.path().join("secondary");
    std::fs::create_dir_all(&secondary_dir).unwrap();
    let secondary = wordlist_fixture(&secondary_dir, &["login", "backup"]);

    let req = DirectoryScanRequest {
        target: "http://127.0.0.1:1".to_string(),
        wordlist: primary.to_string_lossy().to_string(),
        wordlist_2: Some(secondary.to_string_lossy().to_string()),
        json_file_path: Some("dir_scan_run_combined".to_string()),
        json_file_name: "directory_scan.json".to_string(),
        concurrency: 100,
        timeout: 2,
    };

    match directory_scan::run(req).await {
        // "login" appears in both files; canonical behavior keeps the
        // duplicate rather than deduplicating (spec.md §9).
        ApiResult::Ok { data } => assert_eq!(data.total_probed, 4),
        ApiResult::Err { error } => panic!("expected Ok, got error: {error}"),
    }
}
