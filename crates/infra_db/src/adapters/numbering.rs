//! PostgreSQL number range adapter
//!
//! Implements the `NumberRangeStore` port on top of the numbering
//! repository. The returned guard keeps the row-locking transaction open
//! until it is committed or dropped.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use core_kernel::{two_digit_year, DocumentTypeId, NumberRangeId, TenantId};
use domain_numbering::{
    CounterScope, NumberRange, NumberRangeStore, NumberingError, RangeDefaults, RangeGuard,
};

use crate::error::DatabaseError;
use crate::repositories::numbering::{LockedRangeRow, NumberRangeRow, NumberingRepository};

/// PostgreSQL-backed implementation of the NumberRangeStore port
#[derive(Debug, Clone)]
pub struct PostgresNumberRangeStore {
    repository: NumberingRepository,
}

impl PostgresNumberRangeStore {
    /// Creates a new adapter with the given pool and lock wait bound
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self {
            repository: NumberingRepository::new(pool, lock_timeout),
        }
    }
}

struct PgRangeGuard {
    locked: LockedRangeRow,
    range: NumberRange,
}

#[async_trait]
impl RangeGuard for PgRangeGuard {
    fn range(&self) -> &NumberRange {
        &self.range
    }

    async fn commit(self: Box<Self>, updated: NumberRange) -> Result<(), NumberingError> {
        self.locked
            .save(updated.current_year as i32, updated.current_seq)
            .await
            .map_err(|e| NumberingError::store(e.to_string()))
    }
}

#[async_trait]
impl NumberRangeStore for PostgresNumberRangeStore {
    async fn lock_range(
        &self,
        tenant: TenantId,
        scope: &CounterScope,
        defaults: &RangeDefaults,
        effective_date: NaiveDate,
    ) -> Result<Box<dyn RangeGuard>, NumberingError> {
        let scope_key = scope.storage_key();
        let locked = self
            .repository
            .lock_row(
                *tenant.as_uuid(),
                &scope_key,
                &defaults.format_template,
                defaults.reset_policy.as_str(),
                two_digit_year(effective_date) as i32,
            )
            .await
            .map_err(|e| lock_error(e, &scope_key, self.repository.lock_timeout()))?;

        let range = range_from_row(locked.row())?;
        Ok(Box::new(PgRangeGuard { locked, range }))
    }
}

fn lock_error(error: DatabaseError, scope_key: &str, timeout: Duration) -> NumberingError {
    if error.is_lock_timeout() {
        NumberingError::LockTimeout {
            scope: scope_key.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        NumberingError::store(error.to_string())
    }
}

fn range_from_row(row: &NumberRangeRow) -> Result<NumberRange, NumberingError> {
    Ok(NumberRange {
        id: NumberRangeId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        scope: scope_from_key(&row.scope_key)?,
        format_template: row.format_template.clone(),
        reset_policy: row.reset_policy.parse()?,
        current_year: row.current_year as u32,
        current_seq: row.current_seq,
    })
}

fn scope_from_key(key: &str) -> Result<CounterScope, NumberingError> {
    if key == "contract" {
        return Ok(CounterScope::ContractNumbering);
    }
    if let Some(raw) = key.strip_prefix("doctype:") {
        let uuid = Uuid::parse_str(raw)
            .map_err(|_| NumberingError::store(format!("Malformed scope key '{}'", key)))?;
        return Ok(CounterScope::DocumentType(DocumentTypeId::from_uuid(uuid)));
    }
    Err(NumberingError::store(format!("Unknown scope key '{}'", key)))
}
