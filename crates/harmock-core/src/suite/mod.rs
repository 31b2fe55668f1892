//! Regression suites: wire types and the builder that projects captured
//! entries into expected request/response contracts.

pub mod builder;
pub mod types;

pub use builder::build_suite;
pub use types::{Suite, SuiteAssertion, SuiteItem};
