//! In-memory billing engine harness
//!
//! A fully wired engine (store, number ranges, scheduler, contract service)
//! backed by the in-memory adapters. Tests reach the public surfaces only,
//! the way a deployment would.

use std::sync::Arc;
use std::time::Duration;

use core_kernel::TenantId;
use domain_billing::{BillingScheduler, ContractService};
use domain_documents::DocumentType;
use domain_numbering::NumberAllocator;
use infra_db::{InMemoryBillingStore, InMemoryNumberRangeStore};

use crate::fixtures::DocumentTypeFixtures;

/// A wired-up billing engine over in-memory storage
pub struct BillingHarness {
    pub store: InMemoryBillingStore,
    pub ranges: Arc<InMemoryNumberRangeStore>,
    pub allocator: NumberAllocator,
    pub scheduler: BillingScheduler,
    pub service: ContractService,
    pub tenant: TenantId,
    pub invoice_type: DocumentType,
}

impl BillingHarness {
    /// Creates a harness with one tenant and a seeded "RE" invoice type
    pub async fn new() -> Self {
        Self::with_lock_timeout(Duration::from_secs(5)).await
    }

    /// Same as [`BillingHarness::new`] with a custom number range lock bound
    pub async fn with_lock_timeout(lock_timeout: Duration) -> Self {
        let store = InMemoryBillingStore::new();
        let tenant = TenantId::new();
        let invoice_type = DocumentTypeFixtures::invoice(tenant);
        store.add_document_type(invoice_type.clone()).await;

        let ranges = Arc::new(InMemoryNumberRangeStore::with_lock_timeout(lock_timeout));
        let allocator = NumberAllocator::new(ranges.clone());
        let scheduler = BillingScheduler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            allocator.clone(),
        );
        let service = ContractService::new(Arc::new(store.clone()), allocator.clone(), "V");

        Self {
            store,
            ranges,
            allocator,
            scheduler,
            service,
            tenant,
            invoice_type,
        }
    }

    /// Seeds an additional document type
    pub async fn add_document_type(&self, document_type: DocumentType) {
        self.store.add_document_type(document_type).await;
    }
}
