//! Process-wide tracing setup shared by the API and worker binaries.

pub mod tracing;

pub use self::tracing::{DEFAULT_FILTER, init, init_for_tests, init_with_default};
