//! Error taxonomy for the recon engine.
//!
//! Probe-level transport failures are never surfaced through this type —
//! they are captured inline on the `ProbeRecord` (`success: false`,
//! `error: Some(..)`) per the propagation policy: individual probe
//! failures must never abort a batch. `ReconError` is reserved for
//! config/analysis/io failures that legitimately abort one call.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReconResult<T> = Result<T, ReconError>;
