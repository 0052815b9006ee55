//! Number range repository implementation
//!
//! Number ranges are single counter rows guarded by `SELECT ... FOR UPDATE`.
//! The lock wait is bounded with a transaction-local `lock_timeout` so a
//! stuck allocator surfaces as an error instead of queueing forever.

use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Database row for a number range counter
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NumberRangeRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub scope_key: String,
    pub format_template: String,
    pub reset_policy: String,
    pub current_year: i32,
    pub current_seq: i64,
}

/// Repository for number range counters
#[derive(Debug, Clone)]
pub struct NumberingRepository {
    pool: PgPool,
    lock_timeout: Duration,
}

/// A counter row held under an exclusive row lock
///
/// The lock lives as long as the wrapped transaction: `save` commits and
/// releases it, dropping the guard rolls back and releases it.
pub struct LockedRangeRow {
    tx: Transaction<'static, Postgres>,
    row: NumberRangeRow,
}

impl NumberingRepository {
    /// Creates a new NumberingRepository with the given connection pool
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// The configured bound on row lock waits
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Locks the counter row for (tenant, scope), creating it lazily
    ///
    /// The row is inserted with `ON CONFLICT DO NOTHING` before the locking
    /// select, so concurrent first allocations for the same scope converge
    /// on a single row.
    ///
    /// # Errors
    ///
    /// Returns `LockNotAvailable` when the row lock cannot be acquired
    /// within the configured timeout.
    pub async fn lock_row(
        &self,
        tenant_id: Uuid,
        scope_key: &str,
        format_template: &str,
        reset_policy: &str,
        current_year: i32,
    ) -> Result<LockedRangeRow, DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(|e| DatabaseError::from(&e))?;

        // SET does not take bind parameters; the value comes from a Duration.
        let timeout = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout.as_millis());
        sqlx::query(&timeout)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from(&e))?;

        sqlx::query(
            r#"
            INSERT INTO number_ranges (
                id, tenant_id, scope_key, format_template,
                reset_policy, current_year, current_seq
            ) VALUES ($1, $2, $3, $4, $5, $6, 0)
            ON CONFLICT (tenant_id, scope_key) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(tenant_id)
        .bind(scope_key)
        .bind(format_template)
        .bind(reset_policy)
        .bind(current_year)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        let row = sqlx::query_as::<_, NumberRangeRow>(
            r#"
            SELECT id, tenant_id, scope_key, format_template,
                   reset_policy, current_year, current_seq
            FROM number_ranges
            WHERE tenant_id = $1 AND scope_key = $2
            FOR UPDATE
            "#,
        )
        .bind(tenant_id)
        .bind(scope_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        Ok(LockedRangeRow { tx, row })
    }
}

impl LockedRangeRow {
    /// The counter row as read under the lock
    pub fn row(&self) -> &NumberRangeRow {
        &self.row
    }

    /// Writes the advanced counter state and commits, releasing the lock
    pub async fn save(mut self, current_year: i32, current_seq: i64) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE number_ranges
            SET current_year = $1, current_seq = $2
            WHERE id = $3
            "#,
        )
        .bind(current_year)
        .bind(current_seq)
        .bind(self.row.id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        self.tx.commit().await.map_err(|e| DatabaseError::from(&e))
    }
}
