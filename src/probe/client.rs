//! Shared, connection-pooled HTTP client construction.
//!
//! Grounded in the teacher's `http_client.rs` (`create_optimized_client`):
//! same pooling/timeout/TLS knobs, generalized so pool size tracks the
//! Prober's concurrency budget rather than a hardcoded constant.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Build a client scoped to one Prober instance. Per spec.md §4.3, the
/// per-host connection pool is sized to `concurrency` for keepalive
/// reuse, and the client is shared by every request in the batch.
pub fn build_scoped_client(concurrency: usize, timeout_secs: u64) -> reqwest::Result<Client> {
    ClientBuilder::new()
        .pool_max_idle_per_host(concurrency)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(5.min(timeout_secs.max(1))))
        .gzip(true)
        .brotli(true)
        .use_rustls_tls()
        .tls_sni(true)
        .https_only(false)
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent("reconsage/0.1 (+recon scanner)")
        // This is a recon tool aimed at arbitrary, often self-signed
        // targets; certificate trust is not meaningful here.
        .danger_accept_invalid_certs(true)
        .build()
}
