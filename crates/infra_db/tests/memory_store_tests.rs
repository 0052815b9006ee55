//! Behavioral tests against the in-memory adapters
//!
//! These suites exercise the concurrency contracts the PostgreSQL adapters
//! promise (serialized counters, bounded lock waits, one run per period)
//! and the full generation path from contract creation to document.

use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use core_kernel::{CustomerId, TenantId};
use domain_billing::{BillingInterval, BillingStore, NewContract, RunStatus};
use domain_numbering::{
    CounterScope, NumberAllocator, NumberRangeStore, NumberingError, RangeDefaults,
};
use infra_db::InMemoryNumberRangeStore;
use test_utils::{BillingHarness, DateFixtures, PaymentTermFixtures, TestContractBuilder, TestLineBuilder};

fn hosting(h: &BillingHarness) -> NewContract {
    NewContract {
        tenant_id: h.tenant,
        customer_id: CustomerId::new(),
        document_type_id: h.invoice_type.id,
        payment_term_id: None,
        interval: BillingInterval::Monthly,
        start_date: DateFixtures::jan_1_2026(),
        end_date: None,
        lines: vec![TestLineBuilder::new().build()],
    }
}

mod numbering_concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_allocations_never_collide() {
        let store = InMemoryNumberRangeStore::new();
        let allocator = NumberAllocator::new(Arc::new(store));
        let tenant = TenantId::new();
        let scope = CounterScope::ContractNumbering;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                allocator
                    .allocate(tenant, scope, "RE", DateFixtures::jan_1_2026())
                    .await
            }));
        }

        let mut numbers = HashSet::new();
        for handle in handles {
            let number = handle.await.unwrap().unwrap();
            assert!(numbers.insert(number), "duplicate number allocated");
        }

        let expected: HashSet<String> =
            (1..=16).map(|seq| format!("RE26-{:04}", seq)).collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test]
    async fn test_lock_wait_is_bounded() {
        let store = InMemoryNumberRangeStore::with_lock_timeout(Duration::from_millis(20));
        let tenant = TenantId::new();
        let scope = CounterScope::ContractNumbering;
        let defaults = RangeDefaults::default();
        let date = DateFixtures::jan_1_2026();

        let held = store.lock_range(tenant, &scope, &defaults, date).await.unwrap();

        let blocked = store.lock_range(tenant, &scope, &defaults, date).await;
        match blocked {
            Err(err @ NumberingError::LockTimeout { .. }) => assert!(err.is_retryable()),
            other => panic!("expected lock timeout, got {:?}", other.map(|_| ())),
        }

        // Dropping the guard rolls back and releases the lock.
        drop(held);
        assert!(store.lock_range(tenant, &scope, &defaults, date).await.is_ok());
    }

    #[tokio::test]
    async fn test_abandoned_guard_consumes_no_sequence() {
        let store = Arc::new(InMemoryNumberRangeStore::new());
        let tenant = TenantId::new();
        let scope = CounterScope::ContractNumbering;
        let date = DateFixtures::jan_1_2026();

        let guard = store
            .lock_range(tenant, &scope, &RangeDefaults::default(), date)
            .await
            .unwrap();
        drop(guard);

        let allocator = NumberAllocator::new(store);
        let number = allocator.allocate(tenant, scope, "V", date).await.unwrap();
        assert_eq!(number, "V26-0001");
    }
}

mod billing_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_end_to_end_monthly_generation() {
        let h = BillingHarness::new().await;
        let term = PaymentTermFixtures::net_14();
        let term_id = term.id;
        h.store.add_payment_term(term).await;

        let mut input = hosting(&h);
        input.payment_term_id = Some(term_id);
        let contract = h.service.create(input).await.unwrap();
        assert_eq!(contract.contract_number, "V26-0001");

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, DateFixtures::jan_1_2026())
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, RunStatus::Success);

        let document = h.store.document(outcomes[0].document_id.unwrap()).await.unwrap();
        assert_eq!(document.number, "RE26-0001");
        assert_eq!(document.total_net, dec!(100.00));
        assert_eq!(document.total_tax, dec!(19.00));
        assert_eq!(document.total_gross, dec!(119.00));
        assert_eq!(document.due_date, Some(DateFixtures::day(2026, 1, 15)));

        let advanced = h.store.contract(contract.id).await.unwrap();
        assert_eq!(advanced.next_run_date, DateFixtures::day(2026, 2, 1));
        assert_eq!(advanced.last_run_date, Some(DateFixtures::jan_1_2026()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_batches_generate_once() {
        let h = BillingHarness::new().await;
        let contract = h.service.create(hosting(&h)).await.unwrap();

        let (a, b) = tokio::join!(
            h.scheduler.run_due_billing(h.tenant, DateFixtures::jan_1_2026()),
            h.scheduler.run_due_billing(h.tenant, DateFixtures::jan_1_2026()),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        // Whichever batch loses the race reports the winner's record or a
        // SKIPPED one; either way exactly one document exists.
        assert_eq!(h.store.documents().await.len(), 1);
        let runs = h.store.runs_for_contract(contract.id).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Success);
        for outcome in a.iter().chain(b.iter()) {
            assert_ne!(outcome.status, RunStatus::Failed);
        }
    }

    #[tokio::test]
    async fn test_document_numbers_reset_across_year_boundary() {
        let h = BillingHarness::new().await;
        let mut input = hosting(&h);
        input.start_date = DateFixtures::day(2026, 12, 1);
        h.service.create(input).await.unwrap();

        h.scheduler
            .run_due_billing(h.tenant, DateFixtures::day(2026, 12, 1))
            .await
            .unwrap();
        h.scheduler
            .run_due_billing(h.tenant, DateFixtures::jan_1_2027())
            .await
            .unwrap();

        let numbers: Vec<String> = h
            .store
            .documents()
            .await
            .iter()
            .map(|doc| doc.number.clone())
            .collect();
        assert_eq!(numbers, vec!["RE26-0001", "RE27-0001"]);
    }

    #[tokio::test]
    async fn test_month_end_schedule_clamps_and_recovers() {
        let h = BillingHarness::new().await;
        let mut input = hosting(&h);
        input.start_date = DateFixtures::jan_31_2026();
        let contract = h.service.create(input).await.unwrap();

        h.scheduler
            .run_due_billing(h.tenant, DateFixtures::jan_31_2026())
            .await
            .unwrap();

        let advanced = h.store.contract(contract.id).await.unwrap();
        assert_eq!(advanced.next_run_date, DateFixtures::day(2026, 2, 28));
    }

    #[tokio::test]
    async fn test_duplicate_contract_number_rejected() {
        let h = BillingHarness::new().await;
        let first = h.service.create(hosting(&h)).await.unwrap();

        let copy = TestContractBuilder::new(h.tenant, h.invoice_type.id)
            .with_number(first.contract_number.clone())
            .build();
        assert!(h.store.insert_contract(&copy).await.is_err());
    }

    #[tokio::test]
    async fn test_allocation_failure_surfaces_as_failed_run() {
        // A zero lock bound makes every allocation time out, which the
        // scheduler must convert into a FAILED run rather than a panic or
        // a batch abort.
        let h = BillingHarness::with_lock_timeout(Duration::from_millis(0)).await;
        let contract = TestContractBuilder::new(h.tenant, h.invoice_type.id).build();
        h.store.insert_contract(&contract).await.unwrap();

        // Hold the invoice scope lock so the scheduler's allocation starves.
        let scope = CounterScope::DocumentType(h.invoice_type.id);
        let _held = h
            .ranges
            .lock_range(h.tenant, &scope, &RangeDefaults::default(), DateFixtures::jan_1_2026())
            .await
            .unwrap();

        let outcomes = h
            .scheduler
            .run_due_billing(h.tenant, DateFixtures::jan_1_2026())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, RunStatus::Failed);
        assert!(outcomes[0]
            .message
            .as_deref()
            .unwrap()
            .contains("lock"));
        assert!(h.store.documents().await.is_empty());
    }
}
