//! Storage and master-data ports for the billing domain
//!
//! Stores take and return whole value structs; every write method is one
//! transaction boundary. The scheduler's no-partial-write guarantee rests on
//! `commit_generation` being atomic.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use core_kernel::{ContractId, DocumentTypeId, PaymentTermId, TenantId};
use domain_documents::{DocumentType, PaymentTerm, SalesDocument};

use crate::contract::Contract;
use crate::run::ContractRun;

/// Errors surfaced by billing stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// A run for (contract, run_date) already exists
    ///
    /// Raised by the uniqueness constraint when two processes race on the
    /// same period; the scheduler normalizes this to a SKIPPED outcome.
    #[error("Run already recorded for contract {contract_id} on {run_date}")]
    DuplicateRun {
        contract_id: ContractId,
        run_date: NaiveDate,
    },

    /// The requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The write conflicts with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The datastore is unreachable or failing
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend fault
    #[error("Store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        StoreError::NotFound(format!("{} '{}'", entity, id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal(message.into())
    }

    /// Returns true for race-induced duplicate run inserts
    pub fn is_duplicate_run(&self) -> bool {
        matches!(self, StoreError::DuplicateRun { .. })
    }
}

/// Transactional store for contracts, documents, and run history
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Contracts with `is_active` and `next_run_date <= reference_date`
    ///
    /// The business in-term filter (end date) is applied by the scheduler.
    async fn due_contracts(
        &self,
        tenant: TenantId,
        reference_date: NaiveDate,
    ) -> Result<Vec<Contract>, StoreError>;

    /// Persists a new contract
    async fn insert_contract(&self, contract: &Contract) -> Result<(), StoreError>;

    /// The run recorded for (contract, run_date), if any
    async fn find_run(
        &self,
        contract_id: ContractId,
        run_date: NaiveDate,
    ) -> Result<Option<ContractRun>, StoreError>;

    /// All runs recorded for a contract, oldest first
    async fn runs_for_contract(
        &self,
        contract_id: ContractId,
    ) -> Result<Vec<ContractRun>, StoreError>;

    /// Atomically persists one successful generation
    ///
    /// Inserts the document with its lines, appends the SUCCESS run, and
    /// updates the contract's schedule fields in a single transaction.
    /// Either everything commits or nothing does.
    ///
    /// # Errors
    ///
    /// `DuplicateRun` if another process already recorded a run for this
    /// (contract, run_date) — the whole transaction is rolled back.
    async fn commit_generation(
        &self,
        document: &SalesDocument,
        run: &ContractRun,
        advanced_contract: &Contract,
    ) -> Result<(), StoreError>;

    /// Appends a single run record in its own transaction
    ///
    /// Used for FAILED and SKIPPED outcomes, committed separately from any
    /// rolled-back generation so the outcome is durable.
    async fn record_run(&self, run: &ContractRun) -> Result<(), StoreError>;
}

/// Read-only source of document type master data
#[async_trait]
pub trait DocumentTypeSource: Send + Sync {
    async fn document_type(
        &self,
        tenant: TenantId,
        id: DocumentTypeId,
    ) -> Result<DocumentType, StoreError>;
}

/// Read-only source of payment term master data
#[async_trait]
pub trait PaymentTermSource: Send + Sync {
    async fn payment_term(&self, id: PaymentTermId) -> Result<PaymentTerm, StoreError>;
}
