//! Scheduler and contract service tests against in-memory doubles
//!
//! The doubles here model the store contracts precisely enough to drive the
//! scheduler's control flow, including the duplicate-run uniqueness rule.
//! Database-level concurrency is exercised in infra_db.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{ContractId, DocumentTypeId, PaymentTermId, TaxRate, TenantId};
use domain_billing::{
    BillingInterval, BillingScheduler, Contract, ContractLine, ContractRun, ContractService,
    BillingStore, DocumentTypeSource, NewContract, PaymentTermSource, RunStatus, StoreError,
};
use domain_documents::{DocumentType, PaymentTerm, SalesDocument};
use domain_numbering::{
    CounterScope, NumberAllocator, NumberRange, NumberRangeStore, NumberingError, RangeDefaults,
    RangeGuard,
};

// ============================================================================
// In-memory doubles
// ============================================================================

#[derive(Default)]
struct MemState {
    contracts: HashMap<ContractId, Contract>,
    documents: Vec<SalesDocument>,
    runs: Vec<ContractRun>,
    document_types: HashMap<DocumentTypeId, DocumentType>,
    payment_terms: HashMap<PaymentTermId, PaymentTerm>,
    // When set, the next commit_generation reports a duplicate run as if a
    // concurrent invocation had won the insert race.
    steal_next_commit: bool,
}

#[derive(Clone, Default)]
struct MemStore {
    state: Arc<Mutex<MemState>>,
}

impl MemStore {
    async fn add_contract(&self, contract: Contract) {
        self.state
            .lock()
            .await
            .contracts
            .insert(contract.id, contract);
    }

    async fn add_document_type(&self, document_type: DocumentType) {
        self.state
            .lock()
            .await
            .document_types
            .insert(document_type.id, document_type);
    }

    async fn add_payment_term(&self, term: PaymentTerm) {
        self.state.lock().await.payment_terms.insert(term.id, term);
    }

    async fn documents(&self) -> Vec<SalesDocument> {
        self.state.lock().await.documents.clone()
    }

    async fn contract(&self, id: ContractId) -> Contract {
        self.state.lock().await.contracts[&id].clone()
    }

    async fn arm_commit_race(&self) {
        self.state.lock().await.steal_next_commit = true;
    }
}

#[async_trait]
impl BillingStore for MemStore {
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
        Ok(state
            .runs
            .iter()
            .filter(|r| r.contract_id == contract_id)
            .cloned()
            .collect())
    }

    async fn commit_generation(
        &self,
        document: &SalesDocument,
        run: &ContractRun,
        advanced_contract: &Contract,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.steal_next_commit {
            state.steal_next_commit = false;
            return Err(StoreError::DuplicateRun {
                contract_id: run.contract_id,
                run_date: run.run_date,
            });
        }
        if state
            .runs
            .iter()
            .any(|r| r.contract_id == run.contract_id && r.run_date == run.run_date)
        {
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
        if state
            .runs
            .iter()
            .any(|r| r.contract_id == run.contract_id && r.run_date == run.run_date)
        {
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
impl DocumentTypeSource for MemStore {
    async fn document_type(
        &self,
        _tenant: TenantId,
        id: DocumentTypeId,
    ) -> Result<DocumentType, StoreError> {
        let state = self.state.lock().await;
        state
            .document_types
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("document type", id))
    }
}

#[async_trait]
impl PaymentTermSource for MemStore {
    async fn payment_term(&self, id: PaymentTermId) -> Result<PaymentTerm, StoreError> {
        let state = self.state.lock().await;
        state
            .payment_terms
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("payment term", id))
    }
}

struct MemRanges {
    ranges: Arc<Mutex<HashMap<(TenantId, String), NumberRange>>>,
}

impl MemRanges {
    fn new() -> Self {
        Self {
            ranges: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

struct MemRangeGuard {
    map: OwnedMutexGuard<HashMap<(TenantId, String), NumberRange>>,
    key: (TenantId, String),
    snapshot: NumberRange,
}

#[async_trait]
impl RangeGuard for MemRangeGuard {
    fn range(&self) -> &NumberRange {
        &self.snapshot
    }

    async fn commit(mut self: Box<Self>, updated: NumberRange) -> Result<(), NumberingError> {
        self.map.insert(self.key.clone(), updated);
        Ok(())
    }
}

#[async_trait]
impl NumberRangeStore for MemRanges {
    async fn lock_range(
        &self,
        tenant: TenantId,
        scope: &CounterScope,
        defaults: &RangeDefaults,
        effective_date: NaiveDate,
    ) -> Result<Box<dyn RangeGuard>, NumberingError> {
        let key = (tenant, scope.storage_key());
        let mut map = self.ranges.clone().lock_owned().await;
        let snapshot = map
            .entry(key.clone())
            .or_insert_with(|| NumberRange::new(tenant, *scope, defaults, effective_date))
            .clone();
        Ok(Box::new(MemRangeGuard { map, key, snapshot }))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

struct Harness {
    store: MemStore,
    scheduler: BillingScheduler,
    tenant: TenantId,
    invoice_type: DocumentType,
}

async fn harness() -> Harness {
    let store = MemStore::default();
    let tenant = TenantId::new();
    let invoice_type = DocumentType::new(tenant, "invoice", "Invoice", "RE")
        .unwrap()
        .invoice();
    store.add_document_type(invoice_type.clone()).await;

    let allocator = NumberAllocator::new(Arc::new(MemRanges::new()));
    let scheduler = BillingScheduler::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        allocator,
    );
    Harness {
        store,
        scheduler,
        tenant,
        invoice_type,
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn hosting_contract(h: &Harness, number: &str, start: NaiveDate) -> Contract {
    let mut contract = Contract::new(
        h.tenant,
        number,
        core_kernel::CustomerId::new(),
        h.invoice_type.id,
        BillingInterval::Monthly,
        start,
    );
    contract.add_line(ContractLine::new(
        1,
        "Web hosting",
        dec!(1),
        dec!(100.00),
        TaxRate::new(dec!(0.19)),
    ));
    contract
}

// ============================================================================
// Scheduler Tests
// ============================================================================

mod scheduler_tests {
    use super::*;

    #[tokio::test]
    async fn test_generates_document_and_advances_schedule() {
        let h = harness().await;
        let contract = hosting_contract(&h, "V26-0001", d(2026, 1, 1));
        let contract_id = contract.id;
        h.store.add_contract(contract).await;

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, RunStatus::Success);

        let documents = h.store.documents().await;
        assert_eq!(documents.len(), 1);
        let doc = &documents[0];
        assert_eq!(doc.number, "RE26-0001");
        assert_eq!(doc.issue_date, d(2026, 1, 1));
        assert_eq!(doc.total_net, dec!(100.00));
        assert_eq!(doc.total_tax, dec!(19.00));
        assert_eq!(doc.total_gross, dec!(119.00));
        // No payment term on the contract: due on receipt.
        assert_eq!(doc.due_date, Some(d(2026, 1, 1)));
        assert_eq!(outcomes[0].document_id, Some(doc.id));

        let stored = h.store.contract(contract_id).await;
        assert_eq!(stored.last_run_date, Some(d(2026, 1, 1)));
        assert_eq!(stored.next_run_date, d(2026, 2, 1));
    }

    #[tokio::test]
    async fn test_second_invocation_returns_existing_run() {
        let h = harness().await;
        let contract = hosting_contract(&h, "V26-0001", d(2026, 1, 1));
        let contract_id = contract.id;
        h.store.add_contract(contract).await;

        let first = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();
        // Second pass on the same date: the contract is no longer due, so
        // nothing happens at all.
        let second = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(h.store.documents().await.len(), 1);
        assert_eq!(h.store.runs_for_contract(contract_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_existing_run_for_period_is_returned_unchanged() {
        let h = harness().await;
        let contract = hosting_contract(&h, "V26-0001", d(2026, 1, 1));
        let contract_id = contract.id;
        h.store.add_contract(contract).await;

        // Simulate a prior failed attempt that never advanced the schedule.
        let prior = ContractRun::failed(h.tenant, contract_id, d(2026, 1, 1), "out of disk");
        h.store.record_run(&prior).await.unwrap();

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].id, prior.id);
        assert_eq!(outcomes[0].status, RunStatus::Failed);
        assert!(h.store.documents().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_contract_does_not_abort_batch() {
        let h = harness().await;
        let good = hosting_contract(&h, "V26-0001", d(2026, 1, 1));
        let mut bad = hosting_contract(&h, "V26-0002", d(2026, 1, 1));
        bad.interval = "WEEKLY".to_string();
        let good_id = good.id;
        let bad_id = bad.id;
        h.store.add_contract(good).await;
        h.store.add_contract(bad).await;

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        let by_contract: HashMap<_, _> = outcomes.iter().map(|r| (r.contract_id, r)).collect();
        assert_eq!(by_contract[&good_id].status, RunStatus::Success);
        assert_eq!(by_contract[&bad_id].status, RunStatus::Failed);
        assert!(by_contract[&bad_id]
            .message
            .as_deref()
            .unwrap()
            .contains("WEEKLY"));

        // The failed contract produced no document and kept its schedule.
        assert_eq!(h.store.documents().await.len(), 1);
        let bad_stored = h.store.contract(bad_id).await;
        assert_eq!(bad_stored.next_run_date, d(2026, 1, 1));
        assert!(bad_stored.last_run_date.is_none());
    }

    #[tokio::test]
    async fn test_failed_run_is_recorded_durably() {
        let h = harness().await;
        let mut contract = hosting_contract(&h, "V26-0001", d(2026, 1, 1));
        contract.interval = "WEEKLY".to_string();
        let contract_id = contract.id;
        h.store.add_contract(contract).await;

        h.scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        let runs = h.store.runs_for_contract(contract_id).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_out_of_term_contract_is_left_untouched() {
        let h = harness().await;
        let contract =
            hosting_contract(&h, "V26-0001", d(2026, 1, 1)).with_end_date(d(2026, 3, 31));
        let contract_id = contract.id;
        h.store.add_contract(contract).await;

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 4, 1))
            .await
            .unwrap();

        // Silently skipped: no document, no run record, schedule untouched.
        assert!(outcomes.is_empty());
        assert!(h.store.documents().await.is_empty());
        assert!(h.store.runs_for_contract(contract_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catches_up_one_period_per_invocation() {
        let h = harness().await;
        let contract = hosting_contract(&h, "V26-0001", d(2026, 1, 1));
        let contract_id = contract.id;
        h.store.add_contract(contract).await;

        // Three invocations on a late reference date bill the three overdue
        // periods one at a time.
        for _ in 0..3 {
            h.scheduler
                .run_due_billing(h.tenant, d(2026, 3, 15))
                .await
                .unwrap();
        }

        let documents = h.store.documents().await;
        assert_eq!(documents.len(), 3);
        let issue_dates: Vec<NaiveDate> = documents.iter().map(|d| d.issue_date).collect();
        assert_eq!(issue_dates, vec![d(2026, 1, 1), d(2026, 2, 1), d(2026, 3, 1)]);
        assert_eq!(h.store.contract(contract_id).await.next_run_date, d(2026, 4, 1));
    }

    #[tokio::test]
    async fn test_lost_commit_race_is_normalized_to_skipped() {
        let h = harness().await;
        let contract = hosting_contract(&h, "V26-0001", d(2026, 1, 1));
        let contract_id = contract.id;
        h.store.add_contract(contract).await;
        h.store.arm_commit_race().await;

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, RunStatus::Skipped);
        assert!(h.store.documents().await.is_empty());

        let runs = h.store.runs_for_contract(contract_id).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Skipped);
    }

    #[tokio::test]
    async fn test_payment_term_is_snapshotted_onto_document() {
        let h = harness().await;
        let term = PaymentTerm::new("Net 14", 14)
            .with_discount(7, dec!(0.02))
            .unwrap();
        let term_id = term.id;
        h.store.add_payment_term(term).await;

        let contract =
            hosting_contract(&h, "V26-0001", d(2026, 1, 1)).with_payment_term(term_id);
        h.store.add_contract(contract).await;

        h.scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        let documents = h.store.documents().await;
        assert_eq!(documents[0].due_date, Some(d(2026, 1, 15)));
        assert!(documents[0]
            .payment_term_text
            .as_deref()
            .unwrap()
            .contains("14 days"));
    }

    #[tokio::test]
    async fn test_inactive_document_type_fails_the_contract() {
        let h = harness().await;
        let mut dormant = DocumentType::new(h.tenant, "old-invoice", "Old Invoice", "RA")
            .unwrap()
            .invoice();
        dormant.is_active = false;
        let dormant_id = dormant.id;
        h.store.add_document_type(dormant).await;

        let mut contract = hosting_contract(&h, "V26-0001", d(2026, 1, 1));
        contract.document_type_id = dormant_id;
        let contract_id = contract.id;
        h.store.add_contract(contract).await;

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        assert_eq!(outcomes[0].status, RunStatus::Failed);
        assert!(outcomes[0].message.as_deref().unwrap().contains("inactive"));
        assert!(h.store.documents().await.is_empty());
        assert_eq!(h.store.runs_for_contract(contract_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_tenants_are_not_billed() {
        let h = harness().await;
        let foreign_tenant = TenantId::new();
        let mut foreign = hosting_contract(&h, "V26-0009", d(2026, 1, 1));
        foreign.tenant_id = foreign_tenant;
        h.store.add_contract(foreign).await;

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_document_numbers_stay_sequential_across_contracts() {
        let h = harness().await;
        h.store.add_contract(hosting_contract(&h, "V26-0001", d(2026, 1, 1))).await;
        h.store.add_contract(hosting_contract(&h, "V26-0002", d(2026, 1, 1))).await;
        h.store.add_contract(hosting_contract(&h, "V26-0003", d(2026, 1, 1))).await;

        h.scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        let mut numbers: Vec<String> = h
            .store
            .documents()
            .await
            .iter()
            .map(|d| d.number.clone())
            .collect();
        numbers.sort();
        assert_eq!(numbers, vec!["RE26-0001", "RE26-0002", "RE26-0003"]);
    }
}

// ============================================================================
// Contract Service Tests
// ============================================================================

mod service_tests {
    use super::*;

    fn service(h: &Harness) -> ContractService {
        ContractService::new(
            Arc::new(h.store.clone()),
            NumberAllocator::new(Arc::new(MemRanges::new())),
            "V",
        )
    }

    fn new_contract(h: &Harness) -> NewContract {
        NewContract {
            tenant_id: h.tenant,
            customer_id: core_kernel::CustomerId::new(),
            document_type_id: h.invoice_type.id,
            payment_term_id: None,
            interval: BillingInterval::Quarterly,
            start_date: d(2026, 1, 1),
            end_date: None,
            lines: vec![ContractLine::new(
                1,
                "Support retainer",
                dec!(10),
                dec!(85.50),
                TaxRate::new(dec!(0.19)),
            )],
        }
    }

    #[tokio::test]
    async fn test_create_numbers_and_persists_contract() {
        let h = harness().await;
        let svc = service(&h);

        let first = svc.create(new_contract(&h)).await.unwrap();
        let second = svc.create(new_contract(&h)).await.unwrap();

        assert_eq!(first.contract_number, "V26-0001");
        assert_eq!(second.contract_number, "V26-0002");
        assert_eq!(first.next_run_date, d(2026, 1, 1));
        assert!(first.is_active);

        let stored = h.store.contract(first.id).await;
        assert_eq!(stored.contract_number, "V26-0001");
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_term() {
        let h = harness().await;
        let svc = service(&h);

        let mut input = new_contract(&h);
        input.end_date = Some(d(2025, 12, 31));
        assert!(svc.create(input).await.is_err());
    }

    #[tokio::test]
    async fn test_created_contract_is_billable() {
        let h = harness().await;
        let svc = service(&h);

        svc.create(new_contract(&h)).await.unwrap();
        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, d(2026, 1, 1))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, RunStatus::Success);
        let documents = h.store.documents().await;
        // 10 × 85.50 = 855.00 net, 162.45 tax
        assert_eq!(documents[0].total_net, dec!(855.00));
        assert_eq!(documents[0].total_tax, dec!(162.45));
        assert_eq!(documents[0].total_gross, dec!(1017.45));
    }
}
