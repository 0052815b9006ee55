//! Billing CLI
//!
//! Wires the PostgreSQL adapters to the billing scheduler and exposes the
//! two operational surfaces of the engine: triggering a billing run and
//! inspecting the run history of a contract.

pub mod config;

pub use config::CliConfig;

use std::sync::Arc;
use std::time::Duration;

use domain_billing::BillingScheduler;
use domain_numbering::NumberAllocator;
use infra_db::{DatabasePool, PostgresBillingAdapter, PostgresNumberRangeStore};

/// Builds a scheduler bound to PostgreSQL adapters
pub fn build_scheduler(pool: DatabasePool, lock_timeout: Duration) -> BillingScheduler {
    let store = Arc::new(PostgresBillingAdapter::new(pool.clone()));
    let allocator = NumberAllocator::new(Arc::new(PostgresNumberRangeStore::new(
        pool,
        lock_timeout,
    )));
    BillingScheduler::new(store.clone(), store.clone(), store, allocator)
}
