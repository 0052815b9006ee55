//! The number allocator service

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use core_kernel::TenantId;

use crate::error::NumberingError;
use crate::number_range::{CounterScope, RangeDefaults};
use crate::ports::NumberRangeStore;

/// Allocates collision-free sequential document numbers
///
/// The allocator owns the read-increment-write algorithm; the store supplies
/// the per-scope exclusive lock. The lock is held for exactly one allocation,
/// never across surrounding work.
#[derive(Clone)]
pub struct NumberAllocator {
    store: Arc<dyn NumberRangeStore>,
    defaults: RangeDefaults,
}

impl NumberAllocator {
    /// Creates an allocator with default range settings (yearly reset,
    /// `{prefix}{yy}-{seq}` template)
    pub fn new(store: Arc<dyn NumberRangeStore>) -> Self {
        Self {
            store,
            defaults: RangeDefaults::default(),
        }
    }

    /// Overrides the defaults applied to lazily created ranges
    pub fn with_defaults(mut self, defaults: RangeDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Allocates the next number for (tenant, scope)
    ///
    /// Locks the range row (creating it on first use), applies the reset
    /// policy for `effective_date`, increments, persists, and renders the
    /// configured template with `prefix`.
    ///
    /// # Errors
    ///
    /// - `LockTimeout` when the per-scope lock is contended beyond the
    ///   store's bound; safe to retry, no state was changed
    /// - `InvalidTemplate` if the stored template has unknown tokens
    pub async fn allocate(
        &self,
        tenant: TenantId,
        scope: CounterScope,
        prefix: &str,
        effective_date: NaiveDate,
    ) -> Result<String, NumberingError> {
        let guard = self
            .store
            .lock_range(tenant, &scope, &self.defaults, effective_date)
            .await?;

        let mut range = guard.range().clone();
        let sequence = range.next_sequence(effective_date);
        // Render before committing: an invalid template must not consume a
        // sequence number.
        let number = range.render(prefix, sequence, effective_date)?;
        guard.commit(range).await?;

        debug!(%tenant, %scope, sequence, number = %number, "allocated document number");
        Ok(number)
    }
}
