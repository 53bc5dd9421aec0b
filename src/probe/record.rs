//! The Probe Record — the single exchange currency between the
//! Prober and every Analyzer (spec.md §3).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsInfo {
    pub version: String,
    pub cipher_suite: String,
    pub peer_certificate: PeerCertificate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerCertificate {
    pub issuer_o: Option<String>,
    pub issuer_cn: Option<String>,
    pub subject_cn: Option<String>,
    pub san_dns_names: Vec<String>,
    pub serial: String,
    pub signature_algorithm: String,
}

/// Probe Input (spec.md §3). `base_target` is retained with its
/// trailing slash, if present; the Prober normalizes it at request
/// time rather than storing two representations.
#[derive(Debug, Clone)]
pub struct ProbeInput {
    pub base_target: String,
    pub suffix: String,
    pub request_headers: Option<BTreeMap<String, String>>,
    pub query_params: Option<String>,
}

/// Probe Record (spec.md §3). Header keys are lowercased and unique;
/// `content_length` always reflects the bytes actually read, never the
/// `Content-Length` header value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub success: bool,
    pub url: String,
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub latency_ms: Option<f64>,
    #[serde(with = "serde_bytes_as_vec")]
    pub body: Vec<u8>,
    pub body_sha256: String,
    pub content_length: usize,
    pub tls: Option<TlsInfo>,
    pub error: Option<String>,
    pub timestamp: String,
}

mod serde_bytes_as_vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        // Bodies are not expected to round-trip through the JSON reports
        // (the reports carry derived fields, not raw bytes); serialize as
        // a lossy UTF-8 string so reports stay human-readable.
        String::from_utf8_lossy(bytes).into_owned().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        Ok(s.into_bytes())
    }
}

fn sha256_hex(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

impl ProbeRecord {
    /// Build a successful record, computing `body_sha256` and
    /// `content_length` from `body` (the two derived-field invariants
    /// from spec.md §8).
    pub fn success(
        url: String,
        status_code: u16,
        headers: BTreeMap<String, String>,
        latency_ms: f64,
        body: Vec<u8>,
        tls: Option<TlsInfo>,
    ) -> Self {
        let body_sha256 = sha256_hex(&body);
        let content_length = body.len();
        ProbeRecord {
            success: status_code > 0,
            url,
            status_code,
            headers,
            latency_ms: Some(latency_ms),
            body,
            body_sha256,
            content_length,
            tls,
            error: None,
            timestamp: now_timestamp(),
        }
    }

    /// Build an unsuccessful record for a transport failure (timeout,
    /// connect error, DNS failure, ...). `status_code` is always 0.
    pub fn failure(url: String, error: String) -> Self {
        let body_sha256 = sha256_hex(&[]);
        ProbeRecord {
            success: false,
            url,
            status_code: 0,
            headers: BTreeMap::new(),
            latency_ms: None,
            body: Vec::new(),
            body_sha256,
            content_length: 0,
            tls: None,
            error: Some(error),
            timestamp: now_timestamp(),
        }
    }

    #[cfg(test)]
    pub fn transport_failure_stub(url: &str, error: &str) -> Self {
        Self::failure(url.to_string(), error.to_string())
    }

    #[cfg(test)]
    pub fn with_status_for_test(mut self, status: u16) -> Self {
        self.status_code = status;
        self.success = status > 0;
        self
    }
}

/// `normalize(base_target) + ensure_leading_slash(suffix)`, agreeing on
/// exactly one `/` between the two halves (spec.md §3 invariant).
pub fn build_url(base_target: &str, suffix: &str) -> String {
    let base = base_target.trim_end_matches('/');
    let tail = if suffix.starts_with('/') {
        suffix.to_string()
    } else {
        format!("/{suffix}")
    };
    format!("{base}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_always_has_exactly_one_slash_join() {
        assert_eq!(build_url("https://h/", "/a"), "https://h/a");
        assert_eq!(build_url("https://h", "a"), "https://h/a");
        assert_eq!(build_url("https://h/", "a"), "https://h/a");
        assert_eq!(build_url("https://h", "/a"), "https://h/a");
    }

    #[test]
    fn success_record_satisfies_derived_field_invariants() {
        let rec = ProbeRecord::success(
            "https://h/a".to_string(),
            200,
            BTreeMap::new(),
            12.5,
            b"hello".to_vec(),
            None,
        );
        assert_eq!(rec.content_length, rec.body.len());
        assert_eq!(rec.body_sha256, sha256_hex(b"hello"));
        assert!(rec.success);
        assert!(rec.error.is_none());
    }

    #[test]
    fn failure_record_has_zero_status_and_an_error() {
        let rec = ProbeRecord::failure("https://h/a".to_string(), "timed out".to_string());
        assert!(!rec.success);
        assert_eq!(rec.status_code, 0);
        assert!(rec.error.is_some());
    }
}
