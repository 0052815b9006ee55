//! Contract lifecycle service

use std::sync::Arc;
use tracing::info;

use chrono::NaiveDate;
use core_kernel::{CustomerId, DocumentTypeId, PaymentTermId, TenantId};
use domain_numbering::{CounterScope, NumberAllocator};

use crate::contract::{BillingInterval, Contract, ContractLine};
use crate::error::BillingError;
use crate::ports::BillingStore;

/// Input for creating a contract
#[derive(Debug, Clone)]
pub struct NewContract {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub document_type_id: DocumentTypeId,
    pub payment_term_id: Option<PaymentTermId>,
    pub interval: BillingInterval,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub lines: Vec<ContractLine>,
}

/// Creates and numbers contracts
pub struct ContractService {
    store: Arc<dyn BillingStore>,
    allocator: NumberAllocator,
    contract_prefix: String,
}

impl ContractService {
    pub fn new(
        store: Arc<dyn BillingStore>,
        allocator: NumberAllocator,
        contract_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            allocator,
            contract_prefix: contract_prefix.into(),
        }
    }

    /// Creates a contract, drawing its number from the contract range
    pub async fn create(&self, input: NewContract) -> Result<Contract, BillingError> {
        let number = self
            .allocator
            .allocate(
                input.tenant_id,
                CounterScope::ContractNumbering,
                &self.contract_prefix,
                input.start_date,
            )
            .await?;

        let mut contract = Contract::new(
            input.tenant_id,
            number,
            input.customer_id,
            input.document_type_id,
            input.interval,
            input.start_date,
        );
        if let Some(end) = input.end_date {
            contract = contract.with_end_date(end);
        }
        if let Some(term) = input.payment_term_id {
            contract = contract.with_payment_term(term);
        }
        for line in input.lines {
            contract.add_line(line);
        }
        contract.validate()?;

        self.store.insert_contract(&contract).await?;
        info!(
            contract = %contract.contract_number,
            interval = %contract.interval,
            start = %contract.start_date,
            "contract created"
        );
        Ok(contract)
    }
}
