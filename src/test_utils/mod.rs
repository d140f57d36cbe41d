//! Shared fixtures for unit tests: a fault-injecting store wrapper and
//! helpers to assemble a translator stack over it.

mod fixtures;
mod flaky_store;

pub use fixtures::*;
pub use flaky_store::*;
