//! C7 — WAF/CDN Fingerprinter (spec.md §4.7). Header signature tables
//! per vendor, plus an optional Cloudflare TLS confidence score.
//!
//! Vendor tables are exact-match against spec.md §4.7; the Cloudflare
//! TLS scoring weights and 50-point threshold are grounded in
//! `original_source/core_scanner/waf_scanner_module/cf_tls_info_detector.py`.
//! Bypass-technique naming follows the teacher's `waf/bypass.rs`, kept
//! as descriptive catalogue data only — nothing here sends a request.

use crate::probe::record::{ProbeRecord, TlsInfo};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Vendor {
    Cloudflare,
    Fastly,
    Akamai,
    Imperva,
    Aws,
}

impl Vendor {
    fn name(&self) -> &'static str {
        match self {
            Vendor::Cloudflare => "cloudflare",
            Vendor::Fastly => "fastly",
            Vendor::Akamai => "akamai",
            Vendor::Imperva => "imperva",
            Vendor::Aws => "aws",
        }
    }
}

const CLOUDFLARE_MARKERS: &[&str] = &[
    "cf-ray",
    "cf-cache-status",
    "cf-request-id",
    "cf-connecting-ip",
    "cf-ipcountry",
    "cf-warp-tag-id",
    "cf-bgj",
];
const CLOUDFLARE_HIGH_CONFIDENCE: &[&str] = &[
    "cf-chl",
    "cf-chl-bypasses",
    "cf-chl-out",
    "cf-mitigated",
    "cf-turnstile",
    "cf-challenge",
];

const FASTLY_MARKERS: &[&str] = &[
    "x-served-by",
    "x-cached",
    "x-cache-hits",
    "fastly-debug-path",
    "fastly-trace",
    "x-github-request-id",
    "x-ratelimit-limit",
    "x-ratelimit-remaining",
    "x-ratelimit-reset",
];

const AKAMAI_MARKERS: &[&str] = &[
    "akamai-pragma-client-region",
    "x-akamai-transformed",
    "x-akamai-request-id",
    "x-akamai-device-characteristics",
    "x-true-cache-key",
    "x-check-cacheable",
];

const IMPERVA_MARKERS: &[&str] = &["x-iinfo", "x-cdn", "x-incapsula", "x-cdn-request-id"];

const AWS_MARKERS: &[&str] = &[
    "x-amz-cf-id",
    "x-amz-cf-pop",
    "x-amz-cf-paired-pop",
    "x-amzn-trace-id",
    "x-amzn-requestid",
    "x-amzn-errortype",
];

#[derive(Debug, Clone, Serialize)]
pub struct VendorDetection {
    pub vendor: &'static str,
    pub confidence: &'static str,
    pub matched_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct FingerprintReport {
    pub detections: Vec<VendorDetection>,
    pub cloudflare_tls_score: Option<u32>,
    pub cloudflare_tls_says_cloudflare: bool,
}

fn matches_any(headers: &BTreeMap<String, String>, names: &[&str]) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();
    for name in names {
        if let Some(value) = headers.get(*name) {
            found.insert(name.to_string(), value.clone());
        }
    }
    found
}

fn header_contains(headers: &BTreeMap<String, String>, name: &str, needle: &str) -> bool {
    headers
        .get(name)
        .map(|v| v.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn confidence_of(known_marker_count: usize, high_confidence_hit: bool) -> &'static str {
    if high_confidence_hit || known_marker_count >= 2 {
        "high"
    } else {
        "medium"
    }
}

/// `extra_signal` is a substring match on a header not in the vendor's
/// named marker list (e.g. `server` containing `cloudflare`). It widens
/// `matched_headers` for the evidence trail but, per spec.md §4.7's
/// worked example (cf-ray + `server: cloudflare` ⇒ medium, not high),
/// does NOT itself count toward the "≥2 markers ⇒ high" escalation.
fn detect_vendor(
    headers: &BTreeMap<String, String>,
    vendor: Vendor,
    markers: &[&str],
    high_confidence_markers: &[&str],
    extra_signal: Option<(&str, &str)>,
) -> Option<VendorDetection> {
    let mut matched = matches_any(headers, markers);
    let high_hits = matches_any(headers, high_confidence_markers);
    matched.extend(high_hits.clone());
    let known_marker_count = matched.len();

    if let Some((name, value)) = extra_signal {
        matched.insert(name.to_string(), value.to_string());
    }

    if matched.is_empty() {
        return None;
    }

    Some(VendorDetection {
        vendor: vendor.name(),
        confidence: confidence_of(known_marker_count, !high_hits.is_empty()),
        matched_headers: matched,
    })
}

/// Detect CDN/WAF vendors from a Probe Record's (already-lowercased)
/// response headers. A record may match multiple vendors.
pub fn fingerprint(record: &ProbeRecord) -> FingerprintReport {
    let headers = &record.headers;
    let mut detections = Vec::new();

    fn extra_of<'a>(
        headers: &'a BTreeMap<String, String>,
        checks: &[(&'a str, &'a str)],
    ) -> Option<(&'a str, &'a str)> {
        checks
            .iter()
            .find(|(name, needle)| header_contains(headers, name, needle))
            .map(|(name, _)| (*name, headers.get(*name).map(|s| s.as_str()).unwrap_or("")))
    }

    let cf_extra = extra_of(headers, &[("server", "cloudflare")]);
    if let Some(d) = detect_vendor(
        headers,
        Vendor::Cloudflare,
        CLOUDFLARE_MARKERS,
        CLOUDFLARE_HIGH_CONFIDENCE,
        cf_extra,
    ) {
        detections.push(d);
    }

    let fastly_extra = extra_of(
        headers,
        &[("server", "github.com"), ("server", "varnish"), ("via", "1.1 varnish")],
    );
    if let Some(d) = detect_vendor(headers, Vendor::Fastly, FASTLY_MARKERS, &[], fastly_extra) {
        detections.push(d);
    }

    let akamai_extra = extra_of(headers, &[("server", "akamaighost"), ("via", "akamai")]);
    if let Some(d) = detect_vendor(headers, Vendor::Akamai, AKAMAI_MARKERS, &[], akamai_extra) {
        detections.push(d);
    }

    let imperva_extra = extra_of(headers, &[("x-cdn", "imperva"), ("via", "incapsula")]);
    if let Some(d) = detect_vendor(headers, Vendor::Imperva, IMPERVA_MARKERS, &[], imperva_extra) {
        detections.push(d);
    }

    if let Some(d) = detect_vendor(headers, Vendor::Aws, AWS_MARKERS, &[], None) {
        detections.push(d);
    }

    let (cloudflare_tls_score, cloudflare_tls_says_cloudflare) = record
        .tls
        .as_ref()
        .map(|tls| {
            let score = cloudflare_tls_score(tls);
            (Some(score), score >= CLOUDFLARE_TLS_THRESHOLD)
        })
        .unwrap_or((None, false));

    FingerprintReport { detections, cloudflare_tls_score, cloudflare_tls_says_cloudflare }
}

const CLOUDFLARE_TLS_THRESHOLD: u32 = 50;
const KNOWN_CLOUDFLARE_VERSIONS: &[&str] = &["TLSv1.3", "TLSv1.2"];
const KNOWN_CLOUDFLARE_CIPHERS: &[&str] = &["TLS13_AES_128_GCM_SHA256", "TLS13_AES_256_GCM_SHA384"];
const KNOWN_CLOUDFLARE_ISSUER_O: &str = "cloudflare, inc.";
const KNOWN_CLOUDFLARE_ISSUER_CN_SUFFIX: &str = "cloudflare";
const KNOWN_CLOUDFLARE_SAN_SUFFIX: &str = "cloudflaressl.com";
const KNOWN_CLOUDFLARE_SIG_ALGO: &str = "sha256WithRSAEncryption";

/// Cloudflare TLS confidence score per `cf_tls_info_detector.py`'s
/// weighted signal set: version +10, cipher +20, issuer.O +40,
/// issuer.CN +30, subject.CN +25, SAN suffix +25, sig-algo +10.
fn cloudflare_tls_score(tls: &TlsInfo) -> u32 {
    let mut score = 0u32;

    if KNOWN_CLOUDFLARE_VERSIONS.iter().any(|v| tls.version.contains(v)) {
        score += 10;
    }
    if KNOWN_CLOUDFLARE_CIPHERS.iter().any(|c| tls.cipher_suite.contains(c)) {
        score += 20;
    }
    if let Some(o) = &tls.peer_certificate.issuer_o {
        if o.to_lowercase().contains(KNOWN_CLOUDFLARE_ISSUER_O) {
            score += 40;
        }
    }
    if let Some(cn) = &tls.peer_certificate.issuer_cn {
        if cn.to_lowercase().contains(KNOWN_CLOUDFLARE_ISSUER_CN_SUFFIX) {
            score += 30;
        }
    }
    if let Some(cn) = &tls.peer_certificate.subject_cn {
        if cn.to_lowercase().contains(KNOWN_CLOUDFLARE_ISSUER_CN_SUFFIX) {
            score += 25;
        }
    }
    if tls
        .peer_certificate
        .san_dns_names
        .iter()
        .any(|san| san.to_lowercase().contains(KNOWN_CLOUDFLARE_SAN_SUFFIX))
    {
        score += 25;
    }
    if tls.peer_certificate.signature_algorithm.contains(KNOWN_CLOUDFLARE_SIG_ALGO) {
        score += 10;
    }

    score
}

/// Descriptive-only bypass technique names for a detected vendor. This
/// never issues a request; it is report metadata, mirroring the
/// teacher's `waf/bypass.rs::get_strategies` catalogue without the
/// accompanying `test_bypass` execution path.
pub fn bypass_hints(vendor: &str) -> Vec<&'static str> {
    match vendor {
        "cloudflare" => vec![
            "header_injection(x-forwarded-for, x-real-ip)",
            "verb_tampering(head, options)",
            "path_obfuscation",
        ],
        "imperva" => vec![
            "content_type_manipulation",
            "path_traversal",
            "verb_tampering(put, patch)",
        ],
        "akamai" => vec![
            "header_injection(x-forwarded-host, x-original-url)",
            "path_obfuscation",
            "double_url_encoding",
        ],
        "aws" => vec!["verb_tampering(options, head)", "header_injection(x-forwarded-for)"],
        _ => vec!["path_obfuscation", "verb_tampering(head, options, put)", "url_encoding"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_headers(pairs: &[(&str, &str)]) -> ProbeRecord {
        let mut headers = BTreeMap::new();
        for (k, v) in pairs {
            headers.insert(k.to_string(), v.to_string());
        }
        ProbeRecord::success("https://h/a".to_string(), 200, headers, 1.0, Vec::new(), None)
    }

    #[test]
    fn cloudflare_low_marker_is_medium_confidence() {
        let record = record_with_headers(&[("cf-ray", "abc123")]);
        let report = fingerprint(&record);
        let cf = report.detections.iter().find(|d| d.vendor == "cloudflare").unwrap();
        assert_eq!(cf.confidence, "medium");
    }

    #[test]
    fn cloudflare_high_confidence_marker_wins() {
        let record = record_with_headers(&[("cf-mitigated", "challenge")]);
        let report = fingerprint(&record);
        let cf = report.detections.iter().find(|d| d.vendor == "cloudflare").unwrap();
        assert_eq!(cf.confidence, "high");
    }

    #[test]
    fn two_low_markers_escalate_to_high() {
        let record = record_with_headers(&[("cf-ray", "x"), ("cf-cache-status", "HIT")]);
        let report = fingerprint(&record);
        let cf = report.detections.iter().find(|d| d.vendor == "cloudflare").unwrap();
        assert_eq!(cf.confidence, "high");
    }

    #[test]
    fn server_substring_widens_evidence_without_escalating_confidence() {
        // spec.md §8 scenario 5: cf-ray + `server: cloudflare` ⇒ 2 matched
        // headers but only medium confidence (no high-confidence marker,
        // and the server-substring match doesn't count toward the ≥2 rule).
        let record = record_with_headers(&[("cf-ray", "7a...-SJC"), ("server", "cloudflare")]);
        let report = fingerprint(&record);
        let cf = report.detections.iter().find(|d| d.vendor == "cloudflare").unwrap();
        assert_eq!(cf.matched_headers.len(), 2);
        assert_eq!(cf.confidence, "medium");
    }

    #[test]
    fn no_markers_means_no_detection() {
        let record = record_with_headers(&[("content-type", "text/html")]);
        let report = fingerprint(&record);
        assert!(report.detections.is_empty());
    }

    #[test]
    fn multiple_vendors_can_match_the_same_record() {
        let record = record_with_headers(&[("cf-ray", "x"), ("x-amz-cf-id", "y")]);
        let report = fingerprint(&record);
        let vendors: Vec<_> = report.detections.iter().map(|d| d.vendor).collect();
        assert!(vendors.contains(&"cloudflare"));
        assert!(vendors.contains(&"aws"));
    }

    #[test]
    fn cloudflare_tls_score_crosses_threshold_on_strong_signal() {
        let tls = TlsInfo {
            version: "TLSv1.3".to_string(),
            cipher_suite: "TLS13_AES_128_GCM_SHA256".to_string(),
            peer_certificate: crate::probe::record::PeerCertificate {
                issuer_o: Some("Cloudflare, Inc.".to_string()),
                issuer_cn: Some("Cloudflare Inc ECC CA-3".to_string()),
                subject_cn: None,
                san_dns_names: vec![],
                serial: "1".to_string(),
                signature_algorithm: "sha256WithRSAEncryption".to_string(),
            },
        };
        let score = cloudflare_tls_score(&tls);
        assert!(score >= CLOUDFLARE_TLS_THRESHOLD);
    }

    #[test]
    fn bypass_hints_are_descriptive_names_only() {
        let hints = bypass_hints("cloudflare");
        assert!(!hints.is_empty());
        assert!(hints.iter().all(|h| !h.is_empty()));
    }
}
