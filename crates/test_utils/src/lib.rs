//! Test Utilities Crate
//!
//! Provides shared test infrastructure for the billing engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for test data construction
//! - `harness`: A fully wired in-memory billing engine
//! - `generators`: Property-based test data generators

pub mod builders;
pub mod fixtures;
pub mod generators;
pub mod harness;

pub use builders::*;
pub use fixtures::*;
pub use generators::*;
pub use harness::*;
