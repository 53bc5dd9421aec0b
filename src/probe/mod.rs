//! C3 — HTTP Prober. `client` builds the shared, pooled `reqwest::Client`;
//! `record` defines the Probe Input/Record currency; `tls` recovers
//! certificate metadata over a side handshake; `prober` runs the batch.

pub mod client;
pub mod prober;
pub mod record;
pub mod tls;

pub use prober::Prober;
pub use record::{PeerCertificate, ProbeInput, ProbeRecord, TlsInfo};
