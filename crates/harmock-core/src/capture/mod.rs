//! Capture import: HAR documents parsed into immutable entries and mocks.

pub mod har;
pub mod types;

pub use har::parse_capture;
pub use types::{BodyMode, Entry, MatchMode, Mock};
