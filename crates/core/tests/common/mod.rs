//! Common test utilities shared by the integration tests.
//!
//! - Seeded stores and a loaded board manager
//! - Event assertions
//! - Waiting helpers for interleaved moves

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
