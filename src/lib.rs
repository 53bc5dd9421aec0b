//! `reconsage` — an adaptive HTTP(S) recon scanner (spec.md §1).
//!
//! The engineering substance lives in the probe-and-analysis engine
//! (`governor`, `probe`, `analyze`), not the API layer (`api`,
//! `orchestrate`) that calls it. `sink` and `wordlist` are the two
//! small leaf collaborators every orchestrator shares.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod governor;
pub mod orchestrate;
pub mod probe;
pub mod sink;
pub mod wordlist;
