//! C1 — Report Sink.
//!
//! Resolves a safe output directory and writes one JSON artifact per
//! analyzer invocation. The fallback chain and sanitization rules are
//! spelled out in spec.md §4.1; grounded in the teacher's
//! `output::results_manager`/`output::writer_jsonl` pair, generalized
//! from "one hardcoded CSV/JSONL pair" to "any serializable report,
//! written under a resolved directory."

use crate::config::{self, ENV_LOG_DIR};
use crate::error::{ReconError, ReconResult};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace any byte outside `[A-Za-z0-9._-]` with `_`, collapse runs of
/// `_`, trim leading/trailing `_`, and truncate to 255 bytes.
fn sanitize(hint: &str) -> String {
    let mut out = String::with_capacity(hint.len());
    let mut last_was_underscore = false;
    for c in hint.chars() {
        let keep = c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-';
        if keep {
            out.push(c);
            last_was_underscore = c == '_';
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_').to_string();
    trimmed.bytes().take(255).map(|b| b as char).collect()
}

fn ensure_json_suffix(name: &str) -> String {
    if name.to_lowercase().ends_with(".json") {
        name.to_string()
    } else {
        format!("{name}.json")
    }
}

fn writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".reconsage_write_probe");
    match std::fs::File::create(&probe) {
        Ok(mut f) => {
            let ok = f.write_all(b"ok").is_ok();
            let _ = std::fs::remove_file(&probe);
            ok
        }
        Err(_) => false,
    }
}

/// Resolve the output directory by priority, stopping at the first
/// writable choice. Step failures are logged and fallen through.
fn resolve_dir(folder_hint: &str) -> PathBuf {
    if let Ok(base) = std::env::var(ENV_LOG_DIR) {
        if !base.is_empty() {
            let dir = PathBuf::from(base).join(folder_hint);
            if writable(&dir) {
                tracing::info!(dir = %dir.display(), "report sink: using LOG_DIR");
                return dir;
            }
            tracing::warn!(dir = %dir.display(), "report sink: LOG_DIR candidate not writable, falling through");
        }
    }

    if let Some(home) = dirs::home_dir() {
        let dir = home.join("reconsage_logs").join(folder_hint);
        if writable(&dir) {
            tracing::info!(dir = %dir.display(), "report sink: using $HOME/reconsage_logs");
            return dir;
        }
        tracing::warn!(dir = %dir.display(), "report sink: home-dir candidate not writable, falling through");
    }

    let cwd_dir = PathBuf::from(".").join(folder_hint);
    if writable(&cwd_dir) {
        tracing::info!(dir = %cwd_dir.display(), "report sink: using current directory");
        return cwd_dir;
    }
    tracing::warn!(dir = %cwd_dir.display(), "report sink: cwd candidate not writable, falling through");

    let tmp_dir = std::env::temp_dir().join(folder_hint);
    tracing::info!(dir = %tmp_dir.display(), "report sink: falling back to system temp dir");
    tmp_dir
}

fn timestamp_suffix() -> String {
    let now = chrono::Local::now();
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Write `payload` as pretty-printed JSON under a resolved directory.
/// Returns the absolute path actually written.
pub fn write<T: Serialize>(folder_hint: &str, file_hint: &str, payload: &T) -> ReconResult<PathBuf> {
    let sanitized_file = sanitize(file_hint);
    if sanitized_file.is_empty() {
        return Err(ReconError::Config("report file_hint sanitizes to empty".to_string()));
    }
    let file_name = ensure_json_suffix(&sanitized_file);

    // An absolute folder_hint is taken literally only when the operator has
    // opted in via RECONSAGE_ALLOW_ABSOLUTE=1 (spec.md §6); otherwise it goes
    // through the same sanitize+fallback-chain path as any other hint, which
    // strips path separators and so never escapes the resolved base directory.
    let dir = if Path::new(folder_hint).is_absolute() && config::absolute_paths_allowed() {
        PathBuf::from(folder_hint)
    } else {
        resolve_dir(&sanitize(folder_hint))
    };
    std::fs::create_dir_all(&dir)?;

    let mut target = dir.join(&file_name);
    if target.exists() {
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "report".to_string());
        let disambiguated = format!("{stem}_{}.json", timestamp_suffix());
        target = dir.join(disambiguated);
    }

    let file = std::fs::File::create(&target)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, payload)
        .map_err(|e| ReconError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    writer.flush()?;

    let absolute = std::fs::canonicalize(&target).unwrap_or(target);
    tracing::info!(path = %absolute.display(), "report written");
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    fn sanitizes_hostile_characters() {
        assert_eq!(sanitize("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize("a  b//c"), "a_b_c");
        assert_eq!(sanitize("___leading_trailing___"), "leading_trailing");
    }

    #[test]
    fn appends_json_suffix_when_missing() {
        assert_eq!(ensure_json_suffix("report"), "report.json");
        assert_eq!(ensure_json_suffix("report.json"), "report.json");
        assert_eq!(ensure_json_suffix("report.JSON"), "report.JSON");
    }

    #[test]
    #[serial]
    fn rejects_empty_file_hint() {
        std::env::set_var(ENV_LOG_DIR, std::env::temp_dir());
        let err = write("folder", "///", &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
    }

    #[test]
    #[serial]
    fn writes_and_disambiguates_collisions() {
        let tmp = tempfile::tempdir().unwrap();
        std::env::set_var(ENV_LOG_DIR, tmp.path());
        let folder = "run_test_sink";

        let first = write(folder, "dup.json", &json!({"n": 1})).unwrap();
        let second = write(folder, "dup.json", &json!({"n": 2})).unwrap();
        assert_ne!(first, second);
        assert!(first.exists());
        assert!(second.exists());
    }

    #[test]
    #[serial]
    fn absolute_folder_hint_is_ignored_without_opt_in() {
        std::env::remove_var(crate::config::ENV_ALLOW_ABSOLUTE);
        let tmp = tempfile::tempdir().unwrap();
        std::env::set_var(ENV_LOG_DIR, tmp.path());

        let absolute_elsewhere = std::env::temp_dir().join("reconsage_sink_elsewhere_test");
        let path = write(absolute_elsewhere.to_str().unwrap(), "r.json", &json!({"n": 1})).unwrap();

        assert!(path.starts_with(std::fs::canonicalize(tmp.path()).unwrap()));
    }

    #[test]
    #[serial]
    fn absolute_folder_hint_is_honored_with_opt_in() {
        std::env::set_var(crate::config::ENV_ALLOW_ABSOLUTE, "1");
        let tmp = tempfile::tempdir().unwrap();
        let absolute_dir = tmp.path().join("exact_dir");

        let path = write(absolute_dir.to_str().unwrap(), "r.json", &json!({"n": 1})).unwrap();

        assert!(path.starts_with(std::fs::canonicalize(&absolute_dir).unwrap()));
        std::env::remove_var(crate::config::ENV_ALLOW_ABSOLUTE);
    }
}
