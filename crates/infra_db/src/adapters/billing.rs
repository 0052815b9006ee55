//! PostgreSQL billing adapter
//!
//! Implements the billing domain ports (`BillingStore`, `DocumentTypeSource`,
//! `PaymentTermSource`) using the `BillingRepository`, translating between
//! domain models and database row types.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{
    ContractId, ContractLineId, ContractRunId, CustomerId, DocumentId, DocumentTypeId, ItemId,
    PaymentTermId, TaxRate, TenantId,
};
use domain_billing::{BillingStore, Contract, ContractLine, ContractRun, RunStatus, StoreError};
use domain_billing::{DocumentTypeSource, PaymentTermSource};
use domain_documents::{DocumentType, PaymentTerm, SalesDocument};

use crate::error::DatabaseError;
use crate::repositories::billing::{
    BillingRepository, ContractLineRow, ContractRow, ContractRunRow, DocumentLineRow, DocumentRow,
    DocumentTypeRow, PaymentTermRow, RUN_UNIQUE_CONSTRAINT,
};

/// PostgreSQL-backed implementation of the billing store ports
#[derive(Debug, Clone)]
pub struct PostgresBillingAdapter {
    repository: BillingRepository,
}

impl PostgresBillingAdapter {
    /// Creates a new PostgreSQL billing adapter
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillingRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BillingRepository {
        &self.repository
    }
}

#[async_trait]
impl BillingStore for PostgresBillingAdapter {
    async fn due_contracts(
        &self,
        tenant: TenantId,
        reference_date: NaiveDate,
    ) -> Result<Vec<Contract>, StoreError> {
        let (contract_rows, line_rows) = self
            .repository
            .due_contracts(*tenant.as_uuid(), reference_date)
            .await
            .map_err(StoreError::from)?;

        contract_rows
            .into_iter()
            .map(|row| {
                let lines = line_rows
                    .iter()
                    .filter(|l| l.contract_id == row.id)
                    .map(contract_line_from_row)
                    .collect();
                contract_from_row(row, lines)
            })
            .collect()
    }

    async fn insert_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        let (row, lines) = contract_to_rows(contract);
        self.repository
            .insert_contract(&row, &lines)
            .await
            .map_err(StoreError::from)
    }

    async fn find_run(
        &self,
        contract_id: ContractId,
        run_date: NaiveDate,
    ) -> Result<Option<ContractRun>, StoreError> {
        self.repository
            .find_run(*contract_id.as_uuid(), run_date)
            .await
            .map_err(StoreError::from)?
            .map(run_from_row)
            .transpose()
    }

    async fn runs_for_contract(
        &self,
        contract_id: ContractId,
    ) -> Result<Vec<ContractRun>, StoreError> {
        self.repository
            .runs_for_contract(*contract_id.as_uuid())
            .await
            .map_err(StoreError::from)?
            .into_iter()
            .map(run_from_row)
            .collect()
    }

    async fn commit_generation(
        &self,
        document: &SalesDocument,
        run: &ContractRun,
        advanced_contract: &Contract,
    ) -> Result<(), StoreError> {
        let (document_row, line_rows) = document_to_rows(document);
        let run_row = run_to_row(run);
        let (contract_row, _) = contract_to_rows(advanced_contract);

        self.repository
            .commit_generation(&document_row, &line_rows, &run_row, &contract_row)
            .await
            .map_err(|e| duplicate_aware(e, run))
    }

    async fn record_run(&self, run: &ContractRun) -> Result<(), StoreError> {
        self.repository
            .insert_run(&run_to_row(run))
            .await
            .map_err(|e| duplicate_aware(e, run))
    }
}

#[async_trait]
impl DocumentTypeSource for PostgresBillingAdapter {
    async fn document_type(
        &self,
        tenant: TenantId,
        id: DocumentTypeId,
    ) -> Result<DocumentType, StoreError> {
        let row = self
            .repository
            .find_document_type(*tenant.as_uuid(), *id.as_uuid())
            .await
            .map_err(StoreError::from)?
            .ok_or_else(|| StoreError::not_found("document type", id))?;
        Ok(document_type_from_row(row))
    }
}

#[async_trait]
impl PaymentTermSource for PostgresBillingAdapter {
    async fn payment_term(&self, id: PaymentTermId) -> Result<PaymentTerm, StoreError> {
        let row = self
            .repository
            .find_payment_term(*id.as_uuid())
            .await
            .map_err(StoreError::from)?
            .ok_or_else(|| StoreError::not_found("payment term", id))?;
        Ok(payment_term_from_row(row))
    }
}

/// Maps a run insert failure, surfacing the uniqueness race as DuplicateRun
fn duplicate_aware(error: DatabaseError, run: &ContractRun) -> StoreError {
    if error.violates_constraint(RUN_UNIQUE_CONSTRAINT) {
        StoreError::DuplicateRun {
            contract_id: run.contract_id,
            run_date: run.run_date,
        }
    } else {
        error.into()
    }
}

fn parse<T>(result: Result<T, impl std::fmt::Display>, column: &str) -> Result<T, StoreError> {
    result.map_err(|e| StoreError::Internal(format!("Bad value in column '{}': {}", column, e)))
}

fn contract_from_row(row: ContractRow, lines: Vec<ContractLine>) -> Result<Contract, StoreError> {
    Ok(Contract {
        id: ContractId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        contract_number: row.contract_number,
        customer_id: CustomerId::from_uuid(row.customer_id),
        document_type_id: DocumentTypeId::from_uuid(row.document_type_id),
        payment_term_id: row.payment_term_id.map(PaymentTermId::from_uuid),
        interval: row.interval,
        start_date: row.start_date,
        end_date: row.end_date,
        next_run_date: row.next_run_date,
        last_run_date: row.last_run_date,
        is_active: row.is_active,
        lines,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn contract_line_from_row(row: &ContractLineRow) -> ContractLine {
    ContractLine {
        id: ContractLineId::from_uuid(row.id),
        position: row.position as u32,
        item_id: row.item_id.map(ItemId::from_uuid),
        description: row.description.clone(),
        quantity: row.quantity,
        unit_price_net: row.unit_price_net,
        tax_rate: TaxRate::new(row.tax_rate),
        discount_eligible: row.discount_eligible,
    }
}

fn contract_to_rows(contract: &Contract) -> (ContractRow, Vec<ContractLineRow>) {
    let row = ContractRow {
        id: *contract.id.as_uuid(),
        tenant_id: *contract.tenant_id.as_uuid(),
        contract_number: contract.contract_number.clone(),
        customer_id: *contract.customer_id.as_uuid(),
        document_type_id: *contract.document_type_id.as_uuid(),
        payment_term_id: contract.payment_term_id.map(|id| *id.as_uuid()),
        interval: contract.interval.clone(),
        start_date: contract.start_date,
        end_date: contract.end_date,
        next_run_date: contract.next_run_date,
        last_run_date: contract.last_run_date,
        is_active: contract.is_active,
        created_at: contract.created_at,
        updated_at: contract.updated_at,
    };
    let lines = contract
        .lines
        .iter()
        .map(|line| ContractLineRow {
            id: *line.id.as_uuid(),
            contract_id: *contract.id.as_uuid(),
            position: line.position as i32,
            item_id: line.item_id.map(|id| *id.as_uuid()),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price_net: line.unit_price_net,
            tax_rate: line.tax_rate.as_decimal(),
            discount_eligible: line.discount_eligible,
        })
        .collect();
    (row, lines)
}

fn document_to_rows(document: &SalesDocument) -> (DocumentRow, Vec<DocumentLineRow>) {
    let row = DocumentRow {
        id: *document.id.as_uuid(),
        tenant_id: *document.tenant_id.as_uuid(),
        document_type_id: *document.document_type_id.as_uuid(),
        number: document.number.clone(),
        status: document.status.as_str().to_string(),
        customer_id: *document.customer_id.as_uuid(),
        source_document_id: document.source_document_id.map(|id| *id.as_uuid()),
        issue_date: document.issue_date,
        due_date: document.due_date,
        payment_term_text: document.payment_term_text.clone(),
        total_net: document.total_net,
        total_tax: document.total_tax,
        total_gross: document.total_gross,
        created_at: document.created_at,
        updated_at: document.updated_at,
    };
    let lines = document
        .lines
        .iter()
        .map(|line| DocumentLineRow {
            id: *line.id.as_uuid(),
            document_id: *document.id.as_uuid(),
            position: line.position as i32,
            item_id: line.item_id.map(|id| *id.as_uuid()),
            description: line.description.clone(),
            line_type: line.line_type.as_str().to_string(),
            is_selected: line.is_selected,
            quantity: line.quantity,
            unit_price_net: line.unit_price_net,
            tax_rate: line.tax_rate.as_decimal(),
            discount_eligible: line.discount_eligible,
            line_net: line.line_net,
            line_tax: line.line_tax,
            line_gross: line.line_gross,
        })
        .collect();
    (row, lines)
}

fn run_from_row(row: ContractRunRow) -> Result<ContractRun, StoreError> {
    let status: RunStatus = parse(row.status.parse(), "status")?;
    Ok(ContractRun {
        id: ContractRunId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        contract_id: ContractId::from_uuid(row.contract_id),
        run_date: row.run_date,
        status,
        document_id: row.document_id.map(DocumentId::from_uuid),
        message: row.message,
        created_at: row.created_at,
    })
}

fn run_to_row(run: &ContractRun) -> ContractRunRow {
    ContractRunRow {
        id: *run.id.as_uuid(),
        tenant_id: *run.tenant_id.as_uuid(),
        contract_id: *run.contract_id.as_uuid(),
        run_date: run.run_date,
        status: run.status.as_str().to_string(),
        document_id: run.document_id.map(|id| *id.as_uuid()),
        message: run.message.clone(),
        created_at: run.created_at,
    }
}

fn document_type_from_row(row: DocumentTypeRow) -> DocumentType {
    DocumentType {
        id: DocumentTypeId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        key: row.key,
        name: row.name,
        prefix: row.prefix,
        is_invoice: row.is_invoice,
        is_correction: row.is_correction,
        requires_due_date: row.requires_due_date,
        is_active: row.is_active,
    }
}

fn payment_term_from_row(row: PaymentTermRow) -> PaymentTerm {
    PaymentTerm {
        id: PaymentTermId::from_uuid(row.id),
        name: row.name,
        net_days: row.net_days as u32,
        discount_days: row.discount_days.map(|d| d as u32),
        discount_rate: row.discount_rate,
    }
}
