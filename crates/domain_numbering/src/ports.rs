//! Storage port for number ranges
//!
//! The port exposes an explicit lock capability: `lock_range` hands out a
//! [`RangeGuard`] that holds the exclusive per-(tenant, scope) lock together
//! with the current row. Committing the guard persists the updated row and
//! releases the lock atomically; dropping it without committing releases the
//! lock with nothing written.

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::TenantId;

use crate::error::NumberingError;
use crate::number_range::{CounterScope, NumberRange, RangeDefaults};

/// Exclusive access to one locked number range row
#[async_trait]
pub trait RangeGuard: Send {
    /// The row as read under the lock
    fn range(&self) -> &NumberRange;

    /// Persists the updated row and releases the lock
    ///
    /// All-or-nothing: on error nothing is persisted and the lock is
    /// released.
    async fn commit(self: Box<Self>, updated: NumberRange) -> Result<(), NumberingError>;
}

/// Storage abstraction for number ranges
///
/// Implementations must make row creation race-safe: when two first-callers
/// race on an absent row, a uniqueness constraint on (tenant, scope) ensures
/// exactly one row is created and the loser retries into a lock acquire.
#[async_trait]
pub trait NumberRangeStore: Send + Sync {
    /// Locks the range row for (tenant, scope), creating it from `defaults`
    /// on first use
    ///
    /// # Errors
    ///
    /// - `LockTimeout` if the lock cannot be acquired within the store's
    ///   configured bound
    /// - `Store` for backend faults
    async fn lock_range(
        &self,
        tenant: TenantId,
        scope: &CounterScope,
        defaults: &RangeDefaults,
        effective_date: NaiveDate,
    ) -> Result<Box<dyn RangeGuard>, NumberingError>;
}
