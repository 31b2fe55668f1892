//! Harmock core: turns a recorded HTTP capture (HAR) into a replayable
//! mock engine plus a regression suite builder.
//!
//! The serving layer (HTTP routing, upload plumbing, persistence, UI)
//! lives elsewhere and consumes this crate through a small surface:
//!
//! - [`capture::parse_capture`] / [`capture::Mock::from_capture`]
//! - [`matching::match_endpoint`] / [`matching::match_sequence`]
//! - [`replay::build_replay`] / [`replay::simulate_delay`]
//! - [`suite::build_suite`]

pub mod canonical;
pub mod capture;
pub mod error;
pub mod matching;
pub mod preview;
pub mod redact;
pub mod replay;
pub mod suite;
