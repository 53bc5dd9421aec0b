use serde::Deserialize;

/// Scan-wide defaults, overridable per-call by orchestrator callers.
///
/// Mirrors the teacher's minimal `Config` struct but extends it with the
/// AIMD floor/ceiling and the environment variable names spec.md §6 names.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanDefaults {
    pub concurrency: u16,
    pub timeout_secs: u64,
    pub concurrency_floor: u16,
    pub concurrency_ceiling: u16,
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            concurrency: 100,
            timeout_secs: 10,
            concurrency_floor: 100,
            concurrency_ceiling: 200,
        }
    }
}

pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_WORDLIST_DIR: &str = "WORDLIST_DIR";
pub const ENV_ALLOW_ABSOLUTE: &str = "RECONSAGE_ALLOW_ABSOLUTE";

/// Resolve a wordlist path against `$WORDLIST_DIR` when it is relative.
pub fn resolve_wordlist_path(path: &str) -> std::path::PathBuf {
    let p = std::path::Path::new(path);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    match std::env::var(ENV_WORDLIST_DIR) {
        Ok(base) if !base.is_empty() => std::path::Path::new(&base).join(p),
        _ => p.to_path_buf(),
    }
}

pub fn absolute_paths_allowed() -> bool {
    std::env::var(ENV_ALLOW_ABSOLUTE)
        .map(|v| v == "1")
        .unwrap_or(false)
}
