//! Domain Adapters
//!
//! This module provides adapter implementations for the domain ports,
//! connecting domain interfaces to concrete storage.
//!
//! # Architecture
//!
//! Each adapter:
//! - Implements a domain port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! The `memory` module carries full in-memory implementations of the same
//! ports for tests and local experimentation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresBillingAdapter, PostgresNumberRangeStore};
//! use domain_billing::BillingStore;
//!
//! let store = PostgresBillingAdapter::new(pool.clone());
//! let ranges = PostgresNumberRangeStore::new(pool, Duration::from_secs(5));
//! ```

pub mod billing;
pub mod memory;
pub mod numbering;

pub use billing::PostgresBillingAdapter;
pub use memory::{InMemoryBillingStore, InMemoryNumberRangeStore};
pub use numbering::PostgresNumberRangeStore;
