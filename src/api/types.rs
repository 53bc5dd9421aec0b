//! Request/response DTOs for the four operations named in spec.md §6.
//! The request-reply transport itself is out of scope (spec.md §1); these
//! are plain `serde`-derived shapes an actual HTTP layer would bind to,
//! giving the orchestrators in `orchestrate` a typed request to accept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_concurrency() -> u16 {
    100
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryScanRequest {
    pub target: String,
    pub wordlist: String,
    pub wordlist_2: Option<String>,
    pub json_file_path: Option<String>,
    pub json_file_name: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: u16,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WafScanRequest {
    pub target: String,
    /// At most 10 paths (spec.md §4.8's "Batch input cap"); the
    /// orchestrator truncates and logs, it does not reject.
    pub wordlist: Vec<String>,
    pub json_file_name: String,
    pub json_file_path: Option<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency: u16,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Attack headers for the active sub-pass (spec.md §4.9); omitted
    /// for the passive pass, which never modifies request headers.
    pub attack_headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitScanRequest {
    pub target: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: u16,
    pub json_file_name: String,
    pub json_file_path: Option<String>,
    /// Warm-up seed paths (≤5, spec.md §4.4).
    pub domains: Vec<String>,
    /// Main-batch paths.
    pub user_paths: Vec<String>,
    pub attack_headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FalsePositiveRequest {
    pub target: Option<String>,
    pub json_file_name: String,
    pub json_full_path: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: u16,
    /// Re-cluster a previously-written directory-scan report instead of
    /// re-probing (spec.md §4.6's two entry points to the same logic).
    pub json_file_to_read: Option<String>,
    pub list_of_targets: Option<Vec<String>>,
}

/// Tagged result envelope (spec.md §9's "heterogeneous return shapes"
/// redesign flag): every orchestrator boundary returns one of these
/// instead of differently-shaped success/failure payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResult<T> {
    Ok { data: T },
    Err { error: String },
}

impl<T> ApiResult<T> {
    pub fn ok(data: T) -> Self {
        ApiResult::Ok { data }
    }

    pub fn err(error: impl std::fmt::Display) -> Self {
        ApiResult::Err { error: error.to_string() }
    }
}
