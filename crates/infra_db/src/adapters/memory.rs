//! In-memory adapters
//!
//! Full implementations of the billing and numbering ports backed by
//! process-local state. They honor the same contracts as the PostgreSQL
//! adapters, including the one-run-per-period uniqueness rule and the
//! bounded lock wait, which makes them suitable for tests and local
//! experimentation without a database.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{ContractId, DocumentId, DocumentTypeId, PaymentTermId, TenantId};
use domain_billing::{
    BillingStore, Contract, ContractRun, DocumentTypeSource, PaymentTermSource, StoreError,
};
use domain_documents::{DocumentType, PaymentTerm, SalesDocument};
use domain_numbering::{
    CounterScope, NumberRange, NumberRangeStore, NumberingError, RangeDefaults, RangeGuard,
};

/// In-memory implementation of the NumberRangeStore port
///
/// Each (tenant, scope) counter lives behind its own async mutex, so two
/// concurrent allocations for the same scope serialize exactly as the
/// row-locked PostgreSQL adapter does.
#[derive(Clone)]
pub struct InMemoryNumberRangeStore {
    ranges: Arc<Mutex<HashMap<(TenantId, String), Arc<Mutex<NumberRange>>>>>,
    lock_timeout: Duration,
}

impl InMemoryNumberRangeStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(Duration::from_secs(5))
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            ranges: Arc::new(Mutex::new(HashMap::new())),
            lock_timeout,
        }
    }

    /// The counter state for a scope, if it has allocated before
    pub async fn range(&self, tenant: TenantId, scope: &CounterScope) -> Option<NumberRange> {
        let map = self.ranges.lock().await;
        match map.get(&(tenant, scope.storage_key())) {
            Some(cell) => Some(cell.lock().await.clone()),
            None => None,
        }
    }
}

impl Default for InMemoryNumberRangeStore {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryRangeGuard {
    cell: OwnedMutexGuard<NumberRange>,
}

#[async_trait]
impl RangeGuard for MemoryRangeGuard {
    fn range(&self) -> &NumberRange {
        &self.cell
    }

    async fn commit(mut self: Box<Self>, updated: NumberRange) -> Result<(), NumberingError> {
        *self.cell = updated;
        Ok(())
    }
}

#[async_trait]
impl NumberRangeStore for InMemoryNumberRangeStore {
    async fn lock_range(
        &self,
        tenant: TenantId,
        scope: &CounterScope,
        defaults: &RangeDefaults,
        effective_date: NaiveDate,
    ) -> Result<Box<dyn RangeGuard>, NumberingError> {
        let cell = {
            let mut map = self.ranges.lock().await;
            map.entry((tenant, scope.storage_key()))
                .or_insert_with(|| {
                    Arc::new(Mutex::new(NumberRange::new(
                        tenant,
                        *scope,
                        defaults,
                        effective_date,
                    )))
                })
                .clone()
        };

        let guard = tokio::time::timeout(self.lock_timeout, cell.lock_owned())
            .await
            .map_err(|_| NumberingError::LockTimeout {
                scope: scope.storage_key(),
                timeout_ms: self.lock_timeout.as_millis() as u64,
            })?;
        Ok(Box::new(MemoryRangeGuard { cell: guard }))
    }
}

#[derive(Default)]
struct BillingState {
    contracts: HashMap<ContractId, Contract>,
    documents: Vec<SalesDocument>,
    runs: Vec<ContractRun>,
    document_types: HashMap<DocumentTypeId, DocumentType>,
    payment_terms: HashMap<PaymentTermId, PaymentTerm>,
}

impl BillingState {
    fn has_run(&self, contract_id: ContractId, run_date: NaiveDate) -> bool {
        self.runs
            .iter()
            .any(|r| r.contract_id == contract_id && r.run_date == run_date)
    }
}

/// In-memory implementation of the billing store and master-data ports
///
/// All state sits behind one async mutex, making every write as atomic as
/// the PostgreSQL adapter's transactions.
#[derive(Clone, Default)]
pub struct InMemoryBillingStore {
    state: Arc<Mutex<BillingState>>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document type
    pub async fn add_document_type(&self, document_type: DocumentType) {
        self.state
            .lock()
            .await
            .document_types
            .insert(document_type.id, document_type);
    }

    /// Seeds a payment term
    pub async fn add_payment_term(&self, term: PaymentTerm) {
        self.state.lock().await.payment_terms.insert(term.id, term);
    }

    /// All generated documents, in generation order
    pub async fn documents(&self) -> Vec<SalesDocument> {
        self.state.lock().await.documents.clone()
    }

    /// A generated document by id
    pub async fn document(&self, id: DocumentId) -> Option<SalesDocument> {
        let state = self.state.lock().await;
        state.documents.iter().find(|d| d.id == id).cloned()
    }

    /// A stored contract by id
    pub async fn contract(&self, id: ContractId) -> Option<Contract> {
        self.state.lock().await.contracts.get(&id).cloned()
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn due_contracts(
        &self,
        tenant: TenantId,
        reference_date: NaiveDate,
    ) -> Result<Vec<Contract>, StoreError> {
        let state = self.state.lock().await;
        let mut due: Vec<Contract> = state
            .contracts
            .values()
            .filter(|c| c.tenant_id == tenant && c.is_due(reference_date))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.contract_number.cmp(&b.contract_number));
        Ok(due)
    }

    async fn insert_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state
            .contracts
            .values()
            .any(|c| c.tenant_id == contract.tenant_id && c.contract_number == contract.contract_number)
        {
            return Err(StoreError::Conflict(format!(
                "Contract number '{}' already exists",
                contract.contract_number
            )));
        }
        state.contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    async fn find_run(
        &self,
        contract_id: ContractId,
        run_date: NaiveDate,
    ) -> Result<Option<ContractRun>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .runs
            .iter()
            .find(|r| r.contract_id == contract_id && r.run_date == run_date)
            .cloned())
    }

    async fn runs_for_contract(
        &self,
        contract_id: ContractId,
    ) -> Result<Vec<ContractRun>, StoreError> {
        let state = self.state.lock().await;
        let mut runs: Vec<ContractRun> = state
            .runs
            .iter()
            .filter(|r| r.contract_id == contract_id)
            .cloned()
            .collect();
        runs.sort_by_key(|r| (r.run_date, r.created_at));
        Ok(runs)
    }

    async fn commit_generation(
        &self,
        document: &SalesDocument,
        run: &ContractRun,
        advanced_contract: &Contract,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.has_run(run.contract_id, run.run_date) {
            return Err(StoreError::DuplicateRun {
                contract_id: run.contract_id,
                run_date: run.run_date,
            });
        }
        state.documents.push(document.clone());
        state.runs.push(run.clone());
        state
            .contracts
            .insert(advanced_contract.id, advanced_contract.clone());
        Ok(())
    }

    async fn record_run(&self, run: &ContractRun) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.has_run(run.contract_id, run.run_date) {
            return Err(StoreError::DuplicateRun {
                contract_id: run.contract_id,
                run_date: run.run_date,
            });
        }
        state.runs.push(run.clone());
        Ok(())
    }
}

#[async_trait]
impl DocumentTypeSource for InMemoryBillingStore {
    async fn document_type(
        &self,
        tenant: TenantId,
        id: DocumentTypeId,
    ) -> Result<DocumentType, StoreError> {
        let state = self.state.lock().await;
        state
            .document_types
            .get(&id)
            .filter(|dt| dt.tenant_id == tenant)
            .cloned()
            .ok_or_else(|| StoreError::not_found("document type", id))
    }
}

#[async_trait]
impl PaymentTermSource for InMemoryBillingStore {
    async fn payment_term(&self, id: PaymentTermId) -> Result<PaymentTerm, StoreError> {
        let state = self.state.lock().await;
        state
            .payment_terms
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("payment term", id))
    }
}
