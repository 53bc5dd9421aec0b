//! The Prober itself: `scan_batch` drives `concurrency` concurrent GETs
//! through one shared client and a Semaphore permit pool, preserving
//! submission order on output per spec.md §5.
//!
//! Retry/backoff on transient transport failures is grounded in the
//! teacher's `probe/http_probe.rs::probe_with_retries` and in
//! `dirbuster-rs`'s retry loop (`other_examples/`): a small, bounded
//! number of attempts with doubling backoff before the batch gives up
//! on one URL and emits an unsuccessful Probe Record, never an `Err`.

use crate::probe::client::build_scoped_client;
use crate::probe::record::{build_url, ProbeInput, ProbeRecord};
use crate::probe::tls;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use url::Url;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 200;

/// One Prober instance owns one shared client and one permit pool, per
/// spec.md §4.3/§5. Both are scoped to the lifetime of a single batch.
pub struct Prober {
    client: Client,
    permits: Arc<Semaphore>,
    timeout_secs: u64,
}

impl Prober {
    pub fn new(concurrency: usize, timeout_secs: u64) -> reqwest::Result<Self> {
        Ok(Prober {
            client: build_scoped_client(concurrency, timeout_secs)?,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            timeout_secs,
        })
    }

    /// Issue `GET target + suffix` for each suffix in `suffixes`, in
    /// submission order. `request_headers`/`query_params` are applied
    /// identically to every request in the batch (the active sub-pass
    /// of a WAF/rate-limit orchestrator supplies these; the passive
    /// sub-pass omits them).
    pub async fn scan_batch(
        &self,
        target: &str,
        suffixes: &[String],
        request_headers: Option<&BTreeMap<String, String>>,
        query_params: Option<&str>,
    ) -> Vec<ProbeRecord> {
        let mut handles = Vec::with_capacity(suffixes.len());

        for suffix in suffixes {
            let url = build_url(target, suffix);
            let url = match query_params {
                Some(q) if !q.is_empty() => format!("{url}?{q}"),
                _ => url,
            };
            let client = self.client.clone();
            let permits = self.permits.clone();
            let headers = request_headers.cloned();
            let timeout_secs = self.timeout_secs;

            handles.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.expect("permit pool closed");
                probe_one_with_retries(&client, &url, timeout_secs, headers.as_ref()).await
            }));
        }

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(record) => records.push(record),
                Err(join_err) => records.push(ProbeRecord::failure(
                    "<unknown>".to_string(),
                    format!("probe task panicked: {join_err}"),
                )),
            }
        }
        records
    }

    /// Issue a single Probe Input (spec.md §3), acquiring one permit
    /// from the same pool as `scan_batch`. Exists for callers that build
    /// up a `ProbeInput` one at a time rather than batching suffixes
    /// against a shared header/query configuration.
    pub async fn probe(&self, input: &ProbeInput) -> ProbeRecord {
        let _permit = self.permits.acquire().await.expect("permit pool closed");
        let url = build_url(&input.base_target, &input.suffix);
        let url = match &input.query_params {
            Some(q) if !q.is_empty() => format!("{url}?{q}"),
            _ => url,
        };
        probe_one_with_retries(&self.client, &url, self.timeout_secs, input.request_headers.as_ref())
            .await
    }

    /// Re-probe a list of already-complete URLs (as opposed to
    /// `target + suffix` pairs). Used by the false-positive analyzer's
    /// live re-probe entry point (spec.md §4.6), where the caller hands
    /// over full URLs rather than a base target and a wordlist.
    pub async fn probe_urls(&self, urls: &[String]) -> Vec<ProbeRecord> {
        let mut handles = Vec::with_capacity(urls.len());
        for url in urls {
            let client = self.client.clone();
            let permits = self.permits.clone();
            let timeout_secs = self.timeout_secs;
            let url = url.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.expect("permit pool closed");
                probe_one_with_retries(&client, &url, timeout_secs, None).await
            }));
        }

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(record) => records.push(record),
                Err(join_err) => records.push(ProbeRecord::failure(
                    "<unknown>".to_string(),
                    format!("probe task panicked: {join_err}"),
                )),
            }
        }
        records
    }
}

async fn probe_one_with_retries(
    client: &Client,
    url: &str,
    timeout_secs: u64,
    request_headers: Option<&BTreeMap<String, String>>,
) -> ProbeRecord {
    let mut backoff_ms = INITIAL_BACKOFF_MS;
    let mut last_error = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        match probe_once(client, url, timeout_secs, request_headers).await {
            Ok(record) => return record,
            Err(e) => {
                last_error = e;
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    ProbeRecord::failure(url.to_string(), last_error)
}

async fn probe_once(
    client: &Client,
    url: &str,
    timeout_secs: u64,
    request_headers: Option<&BTreeMap<String, String>>,
) -> Result<ProbeRecord, String> {
    let start = Instant::now();

    let mut request = client.get(url);
    if let Some(headers) = request_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }

    let outcome = tokio::time::timeout(Duration::from_secs(timeout_secs), request.send())
        .await
        .map_err(|_| format!("request timed out after {timeout_secs}s"))?
        .map_err(|e| e.to_string())?;

    let status_code = outcome.status().as_u16();
    let mut headers = BTreeMap::new();
    for (name, value) in outcome.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_ascii_lowercase(), v.to_string());
        }
    }

    let parsed_url = Url::parse(url).ok();
    let scheme_is_https = parsed_url.as_ref().map(|u| u.scheme() == "https").unwrap_or(false);
    let host_and_port = parsed_url.as_ref().and_then(|u| {
        let host = u.host_str()?.to_string();
        let port = u.port_or_known_default()?;
        Some((host, port))
    });

    let body = outcome.bytes().await.map_err(|e| e.to_string())?.to_vec();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let tls_info = if scheme_is_https {
        match host_and_port {
            Some((host, port)) => tls::tls_of(&host, port).await,
            None => None,
        }
    } else {
        None
    };

    Ok(ProbeRecord::success(
        url.to_string(),
        status_code,
        headers,
        latency_ms,
        body,
        tls_info,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scan_batch_preserves_submission_order_and_count() {
        let prober = Prober::new(4, 2).unwrap();
        let suffixes = vec![
            "/does-not-exist-a".to_string(),
            "/does-not-exist-b".to_string(),
            "/does-not-exist-c".to_string(),
        ];
        // An unroutable target forces every request down the transport-
        // failure path; this exercises ordering/count without a network.
        let records = prober
            .scan_batch("http://127.0.0.1:1", &suffixes, None, None)
            .await;

        assert_eq!(records.len(), suffixes.len());
        for (record, suffix) in records.iter().zip(suffixes.iter()) {
            assert!(record.url.ends_with(suffix.as_str()));
            assert!(!record.success);
            assert_eq!(record.status_code, 0);
        }
    }

    #[tokio::test]
    async fn scan_batch_on_empty_suffixes_returns_empty() {
        let prober = Prober::new(4, 2).unwrap();
        let records = prober.scan_batch("http://127.0.0.1:1", &[], None, None).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn probe_builds_url_from_probe_input() {
        let prober = Prober::new(4, 2).unwrap();
        let input = ProbeInput {
            base_target: "http://127.0.0.1:1/".to_string(),
            suffix: "admin".to_string(),
            request_headers: None,
            query_params: None,
        };
        let record = prober.probe(&input).await;
        assert_eq!(record.url, "http://127.0.0.1:1/admin");
        assert!(!record.success);
    }
}
