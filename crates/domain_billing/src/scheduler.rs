//! The billing scheduler
//!
//! `run_due_billing` is the single trigger surface of the engine: it selects
//! due contracts, generates one draft document per contract inside one
//! transaction each, and records every outcome in the run history.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use core_kernel::TenantId;
use domain_documents::SalesDocument;
use domain_numbering::{CounterScope, NumberAllocator};

use crate::contract::Contract;
use crate::error::BillingError;
use crate::ports::{BillingStore, DocumentTypeSource, PaymentTermSource, StoreError};
use crate::run::ContractRun;

/// Generates invoices from due recurring contracts
///
/// The batch pass itself is single-threaded, but overlapping invocations
/// (e.g. doubled cron triggers) are safe: the number allocator serializes
/// per scope and the (contract, run_date) uniqueness constraint turns race
/// losers into SKIPPED outcomes.
pub struct BillingScheduler {
    store: Arc<dyn BillingStore>,
    document_types: Arc<dyn DocumentTypeSource>,
    payment_terms: Arc<dyn PaymentTermSource>,
    allocator: NumberAllocator,
}

impl BillingScheduler {
    pub fn new(
        store: Arc<dyn BillingStore>,
        document_types: Arc<dyn DocumentTypeSource>,
        payment_terms: Arc<dyn PaymentTermSource>,
        allocator: NumberAllocator,
    ) -> Self {
        Self {
            store,
            document_types,
            payment_terms,
            allocator,
        }
    }

    /// Processes every due contract of a tenant for `reference_date`
    ///
    /// Returns one [`ContractRun`] per processed contract: freshly created
    /// SUCCESS/FAILED records plus the pre-existing records of periods that
    /// were already handled. A single contract's failure never aborts the
    /// batch; only a failing selection query does.
    pub async fn run_due_billing(
        &self,
        tenant: TenantId,
        reference_date: NaiveDate,
    ) -> Result<Vec<ContractRun>, BillingError> {
        let due = self.store.due_contracts(tenant, reference_date).await?;
        info!(%tenant, %reference_date, due = due.len(), "billing batch selected");

        let mut outcomes = Vec::with_capacity(due.len());
        for contract in &due {
            if !contract.is_in_term(reference_date) {
                debug!(contract = %contract.contract_number, "contract past its term, not billed");
                continue;
            }

            match self.process_contract(contract).await {
                Ok(run) => outcomes.push(run),
                Err(err) => {
                    warn!(
                        contract = %contract.contract_number,
                        run_date = %contract.next_run_date,
                        %err,
                        "contract generation failed"
                    );
                    outcomes.push(self.record_failure(contract, &err).await);
                }
            }
        }

        info!(%tenant, outcomes = outcomes.len(), "billing batch finished");
        Ok(outcomes)
    }

    /// Handles one contract: duplicate check, generation, schedule advance
    async fn process_contract(&self, contract: &Contract) -> Result<ContractRun, BillingError> {
        let run_date = contract.next_run_date;

        // Idempotence: an existing run for this period is returned as-is,
        // whatever its status. A prior FAILED run is terminal.
        if let Some(existing) = self.store.find_run(contract.id, run_date).await? {
            debug!(
                contract = %contract.contract_number,
                %run_date,
                status = %existing.status,
                "run already recorded for period"
            );
            return Ok(existing);
        }

        // Resolve everything that can fail before the first write.
        let document_type = self
            .document_types
            .document_type(contract.tenant_id, contract.document_type_id)
            .await?;
        if !document_type.is_active {
            return Err(BillingError::validation(format!(
                "Document type '{}' is inactive",
                document_type.key
            )));
        }
        let advanced = contract.advanced()?;

        // Option (b) of the locking model: the number is allocated in its own
        // short transaction, so the per-scope lock is never held across the
        // document write.
        let number = self
            .allocator
            .allocate(
                contract.tenant_id,
                CounterScope::DocumentType(document_type.id),
                &document_type.prefix,
                run_date,
            )
            .await?;

        let mut document = SalesDocument::new(
            contract.tenant_id,
            document_type.id,
            contract.customer_id,
            number,
            run_date,
        );
        match contract.payment_term_id {
            Some(term_id) => {
                let term = self.payment_terms.payment_term(term_id).await?;
                document.apply_payment_term(&term);
            }
            // No payment term means due on receipt.
            None => document.due_on_receipt(),
        }
        document.set_lines(contract.lines.iter().map(|l| l.to_document_line()).collect());
        document.validate(&document_type)?;

        let run = ContractRun::success(contract.tenant_id, contract.id, run_date, document.id);

        match self.store.commit_generation(&document, &run, &advanced).await {
            Ok(()) => {
                info!(
                    contract = %contract.contract_number,
                    document = %document.number,
                    total_gross = %document.total_gross,
                    next_run = %advanced.next_run_date,
                    "document generated"
                );
                Ok(run)
            }
            Err(StoreError::DuplicateRun { .. }) => {
                // Race loser: a concurrent invocation recorded this period
                // first. Normalize to SKIPPED, never FAILED.
                debug!(
                    contract = %contract.contract_number,
                    %run_date,
                    "lost generation race, treating as skipped"
                );
                match self.store.find_run(contract.id, run_date).await? {
                    Some(existing) => Ok(existing),
                    None => {
                        let skipped = ContractRun::skipped(
                            contract.tenant_id,
                            contract.id,
                            run_date,
                            "concurrent invocation already processed this period",
                        );
                        self.store.record_run(&skipped).await?;
                        Ok(skipped)
                    }
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Durably records a FAILED run outside the rolled-back transaction
    async fn record_failure(&self, contract: &Contract, cause: &BillingError) -> ContractRun {
        let failed = ContractRun::failed(
            contract.tenant_id,
            contract.id,
            contract.next_run_date,
            cause.to_string(),
        );
        match self.store.record_run(&failed).await {
            Ok(()) => failed,
            // Another process may have recorded the period in the meantime;
            // fall back to whatever exists rather than losing the outcome.
            Err(StoreError::DuplicateRun { .. }) => self
                .store
                .find_run(contract.id, contract.next_run_date)
                .await
                .ok()
                .flatten()
                .unwrap_or(failed),
            Err(store_err) => {
                error!(
                    contract = %contract.contract_number,
                    %store_err,
                    "could not persist FAILED run record"
                );
                failed
            }
        }
    }
}
