//! Billing repository implementation
//!
//! This module provides database access for contracts, generated sales
//! documents, the contract run history, and the master data the scheduler
//! resolves at generation time.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// The unique constraint guarding one run per (contract, run date)
pub const RUN_UNIQUE_CONSTRAINT: &str = "contract_runs_contract_id_run_date_key";

/// Database row for a contract header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContractRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub contract_number: String,
    pub customer_id: Uuid,
    pub document_type_id: Uuid,
    pub payment_term_id: Option<Uuid>,
    pub interval: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_run_date: NaiveDate,
    pub last_run_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a contract line template
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContractLineRow {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub position: i32,
    pub item_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price_net: Decimal,
    pub tax_rate: Decimal,
    pub discount_eligible: bool,
}

/// Database row for a sales document header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub document_type_id: Uuid,
    pub number: String,
    pub status: String,
    pub customer_id: Uuid,
    pub source_document_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub payment_term_text: Option<String>,
    pub total_net: Decimal,
    pub total_tax: Decimal,
    pub total_gross: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a sales document line
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentLineRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub position: i32,
    pub item_id: Option<Uuid>,
    pub description: String,
    pub line_type: String,
    pub is_selected: bool,
    pub quantity: Decimal,
    pub unit_price_net: Decimal,
    pub tax_rate: Decimal,
    pub discount_eligible: bool,
    pub line_net: Decimal,
    pub line_tax: Decimal,
    pub line_gross: Decimal,
}

/// Database row for a contract run record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContractRunRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub contract_id: Uuid,
    pub run_date: NaiveDate,
    pub status: String,
    pub document_id: Option<Uuid>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Database row for a document type
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentTypeRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub key: String,
    pub name: String,
    pub prefix: String,
    pub is_invoice: bool,
    pub is_correction: bool,
    pub requires_due_date: bool,
    pub is_active: bool,
}

/// Database row for a payment term
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentTermRow {
    pub id: Uuid,
    pub name: String,
    pub net_days: i32,
    pub discount_days: Option<i32>,
    pub discount_rate: Option<Decimal>,
}

/// Repository for contracts, documents, and the run history
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    /// Creates a new BillingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active contracts of a tenant whose next run date has been reached
    pub async fn due_contracts(
        &self,
        tenant_id: Uuid,
        reference_date: NaiveDate,
    ) -> Result<(Vec<ContractRow>, Vec<ContractLineRow>), DatabaseError> {
        let contracts = sqlx::query_as::<_, ContractRow>(
            r#"
            SELECT id, tenant_id, contract_number, customer_id, document_type_id,
                   payment_term_id, interval, start_date, end_date,
                   next_run_date, last_run_date, is_active, created_at, updated_at
            FROM contracts
            WHERE tenant_id = $1 AND is_active AND next_run_date <= $2
            ORDER BY contract_number
            "#,
        )
        .bind(tenant_id)
        .bind(reference_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        let ids: Vec<Uuid> = contracts.iter().map(|c| c.id).collect();
        let lines = sqlx::query_as::<_, ContractLineRow>(
            r#"
            SELECT id, contract_id, position, item_id, description,
                   quantity, unit_price_net, tax_rate, discount_eligible
            FROM contract_lines
            WHERE contract_id = ANY($1)
            ORDER BY contract_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        Ok((contracts, lines))
    }

    /// Inserts a contract with its lines in a single transaction
    pub async fn insert_contract(
        &self,
        contract: &ContractRow,
        lines: &[ContractLineRow],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(|e| DatabaseError::from(&e))?;

        sqlx::query(
            r#"
            INSERT INTO contracts (
                id, tenant_id, contract_number, customer_id, document_type_id,
                payment_term_id, interval, start_date, end_date,
                next_run_date, last_run_date, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(contract.id)
        .bind(contract.tenant_id)
        .bind(&contract.contract_number)
        .bind(contract.customer_id)
        .bind(contract.document_type_id)
        .bind(contract.payment_term_id)
        .bind(&contract.interval)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.next_run_date)
        .bind(contract.last_run_date)
        .bind(contract.is_active)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        for line in lines {
            insert_contract_line(&mut tx, line).await?;
        }

        tx.commit().await.map_err(|e| DatabaseError::from(&e))
    }

    /// The run recorded for (contract, run_date), if any
    pub async fn find_run(
        &self,
        contract_id: Uuid,
        run_date: NaiveDate,
    ) -> Result<Option<ContractRunRow>, DatabaseError> {
        sqlx::query_as::<_, ContractRunRow>(
            r#"
            SELECT id, tenant_id, contract_id, run_date, status,
                   document_id, message, created_at
            FROM contract_runs
            WHERE contract_id = $1 AND run_date = $2
            "#,
        )
        .bind(contract_id)
        .bind(run_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }

    /// All runs recorded for a contract, oldest first
    pub async fn runs_for_contract(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<ContractRunRow>, DatabaseError> {
        sqlx::query_as::<_, ContractRunRow>(
            r#"
            SELECT id, tenant_id, contract_id, run_date, status,
                   document_id, message, created_at
            FROM contract_runs
            WHERE contract_id = $1
            ORDER BY run_date, created_at
            "#,
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }

    /// Inserts a single run record in its own transaction
    pub async fn insert_run(&self, run: &ContractRunRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO contract_runs (
                id, tenant_id, contract_id, run_date, status,
                document_id, message, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(run.id)
        .bind(run.tenant_id)
        .bind(run.contract_id)
        .bind(run.run_date)
        .bind(&run.status)
        .bind(run.document_id)
        .bind(&run.message)
        .bind(run.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?;
        Ok(())
    }

    /// Persists one generation atomically
    ///
    /// Inserts the document with its lines, appends the run record, and
    /// advances the contract schedule in a single transaction. A unique
    /// violation on [`RUN_UNIQUE_CONSTRAINT`] rolls back everything.
    pub async fn commit_generation(
        &self,
        document: &DocumentRow,
        document_lines: &[DocumentLineRow],
        run: &ContractRunRow,
        contract: &ContractRow,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(|e| DatabaseError::from(&e))?;

        sqlx::query(
            r#"
            INSERT INTO sales_documents (
                id, tenant_id, document_type_id, number, status, customer_id,
                source_document_id, issue_date, due_date, payment_term_text,
                total_net, total_tax, total_gross, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(document.id)
        .bind(document.tenant_id)
        .bind(document.document_type_id)
        .bind(&document.number)
        .bind(&document.status)
        .bind(document.customer_id)
        .bind(document.source_document_id)
        .bind(document.issue_date)
        .bind(document.due_date)
        .bind(&document.payment_term_text)
        .bind(document.total_net)
        .bind(document.total_tax)
        .bind(document.total_gross)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        for line in document_lines {
            sqlx::query(
                r#"
                INSERT INTO sales_document_lines (
                    id, document_id, position, item_id, description, line_type,
                    is_selected, quantity, unit_price_net, tax_rate,
                    discount_eligible, line_net, line_tax, line_gross
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(line.id)
            .bind(line.document_id)
            .bind(line.position)
            .bind(line.item_id)
            .bind(&line.description)
            .bind(&line.line_type)
            .bind(line.is_selected)
            .bind(line.quantity)
            .bind(line.unit_price_net)
            .bind(line.tax_rate)
            .bind(line.discount_eligible)
            .bind(line.line_net)
            .bind(line.line_tax)
            .bind(line.line_gross)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from(&e))?;
        }

        sqlx::query(
            r#"
            INSERT INTO contract_runs (
                id, tenant_id, contract_id, run_date, status,
                document_id, message, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(run.id)
        .bind(run.tenant_id)
        .bind(run.contract_id)
        .bind(run.run_date)
        .bind(&run.status)
        .bind(run.document_id)
        .bind(&run.message)
        .bind(run.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        sqlx::query(
            r#"
            UPDATE contracts
            SET next_run_date = $1, last_run_date = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(contract.next_run_date)
        .bind(contract.last_run_date)
        .bind(contract.updated_at)
        .bind(contract.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        tx.commit().await.map_err(|e| DatabaseError::from(&e))
    }

    /// Fetches a document type scoped to its tenant
    pub async fn find_document_type(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<DocumentTypeRow>, DatabaseError> {
        sqlx::query_as::<_, DocumentTypeRow>(
            r#"
            SELECT id, tenant_id, key, name, prefix, is_invoice,
                   is_correction, requires_due_date, is_active
            FROM document_types
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }

    /// Fetches a payment term
    pub async fn find_payment_term(
        &self,
        id: Uuid,
    ) -> Result<Option<PaymentTermRow>, DatabaseError> {
        sqlx::query_as::<_, PaymentTermRow>(
            r#"
            SELECT id, name, net_days, discount_days, discount_rate
            FROM payment_terms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }
}

async fn insert_contract_line(
    tx: &mut sqlx::Transaction<'static, sqlx::Postgres>,
    line: &ContractLineRow,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO contract_lines (
            id, contract_id, position, item_id, description,
            quantity, unit_price_net, tax_rate, discount_eligible
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(line.id)
    .bind(line.contract_id)
    .bind(line.position)
    .bind(line.item_id)
    .bind(&line.description)
    .bind(line.quantity)
    .bind(line.unit_price_net)
    .bind(line.tax_rate)
    .bind(line.discount_eligible)
    .execute(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(&e))?;
    Ok(())
}
