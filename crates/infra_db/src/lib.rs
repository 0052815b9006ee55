//! Infrastructure Database Layer
//!
//! This crate provides the storage infrastructure for the billing engine:
//! PostgreSQL repositories and adapters built on SQLx, plus in-memory
//! adapters that honor the same port contracts.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories own the SQL and
//! row types; adapters implement the domain ports on top of them and
//! translate rows back into domain models.
//!
//! # Concurrency
//!
//! Two guarantees the adapters uphold for the billing engine:
//! - Number range counters are advanced under an exclusive per-row lock
//!   with a bounded wait
//! - At most one contract run exists per (contract, run date), enforced by
//!   a unique constraint and surfaced as `StoreError::DuplicateRun`
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresBillingAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/rebill")).await?;
//! let store = PostgresBillingAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{
    InMemoryBillingStore, InMemoryNumberRangeStore, PostgresBillingAdapter,
    PostgresNumberRangeStore,
};
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
