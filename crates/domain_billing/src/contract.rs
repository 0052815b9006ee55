//! Recurring contracts
//!
//! A contract is a tenant-scoped billing template. Its lines are immutable
//! templates that get copied into a sales document at every generation; its
//! schedule fields (`next_run_date`, `last_run_date`) are the only mutable
//! state, advanced exclusively by the scheduler inside the per-contract
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    add_months_clamped, ContractId, ContractLineId, CustomerId, DocumentTypeId, ItemId,
    PaymentTermId, TaxRate, TenantId,
};
use domain_documents::{LineType, SalesDocumentLine};

use crate::error::BillingError;

/// Supported billing cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingInterval {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl BillingInterval {
    /// Number of months between two runs
    pub fn months(&self) -> u32 {
        match self {
            BillingInterval::Monthly => 1,
            BillingInterval::Quarterly => 3,
            BillingInterval::SemiAnnual => 6,
            BillingInterval::Annual => 12,
        }
    }

    /// Canonical storage token
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "MONTHLY",
            BillingInterval::Quarterly => "QUARTERLY",
            BillingInterval::SemiAnnual => "SEMI_ANNUAL",
            BillingInterval::Annual => "ANNUAL",
        }
    }

    /// Advances a run date by one interval, clamping to the end of the
    /// target month where needed
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        add_months_clamped(date, self.months())
    }
}

impl fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillingInterval {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MONTHLY" => Ok(BillingInterval::Monthly),
            "QUARTERLY" => Ok(BillingInterval::Quarterly),
            "SEMI_ANNUAL" => Ok(BillingInterval::SemiAnnual),
            "ANNUAL" => Ok(BillingInterval::Annual),
            other => Err(BillingError::UnknownInterval(other.to_string())),
        }
    }
}

/// An immutable line template copied into documents at generation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractLine {
    /// Unique identifier
    pub id: ContractLineId,
    /// 1-based position within the contract
    pub position: u32,
    /// Item master-data reference
    pub item_id: Option<ItemId>,
    /// Description snapshot
    pub description: String,
    /// Quantity billed per run
    pub quantity: Decimal,
    /// Net unit price snapshot
    pub unit_price_net: Decimal,
    /// Tax rate snapshot
    pub tax_rate: TaxRate,
    /// Whether early-payment discount applies
    pub discount_eligible: bool,
}

impl ContractLine {
    pub fn new(
        position: u32,
        description: impl Into<String>,
        quantity: Decimal,
        unit_price_net: Decimal,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            id: ContractLineId::new_v7(),
            position,
            item_id: None,
            description: description.into(),
            quantity,
            unit_price_net,
            tax_rate,
            discount_eligible: true,
        }
    }

    /// Sets the item reference
    pub fn with_item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    /// Sets discount eligibility
    pub fn with_discount_eligible(mut self, eligible: bool) -> Self {
        self.discount_eligible = eligible;
        self
    }

    /// Copies this template into a document line
    ///
    /// Generated lines are always NORMAL and selected; every value is a
    /// snapshot carried over from the template.
    pub fn to_document_line(&self) -> SalesDocumentLine {
        let mut line = SalesDocumentLine::new(
            self.position,
            self.description.clone(),
            self.quantity,
            self.unit_price_net,
            self.tax_rate,
        )
        .with_line_type(LineType::Normal)
        .with_selection(true)
        .with_discount_eligible(self.discount_eligible);
        line.item_id = self.item_id;
        line
    }
}

/// A recurring billing contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier
    pub id: ContractId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Human-readable contract number
    pub contract_number: String,
    /// Billed customer
    pub customer_id: CustomerId,
    /// Type of the documents this contract generates
    pub document_type_id: DocumentTypeId,
    /// Payment term reference, resolved at each generation
    pub payment_term_id: Option<PaymentTermId>,
    /// Billing cadence, stored as its canonical token
    ///
    /// Kept as text so that an out-of-set value surfaces as a FAILED run for
    /// this contract instead of poisoning contract loading for the batch.
    pub interval: String,
    /// First day of the contract term
    pub start_date: NaiveDate,
    /// Last day of the contract term, unbounded if absent
    pub end_date: Option<NaiveDate>,
    /// Next scheduled generation date
    pub next_run_date: NaiveDate,
    /// Most recent generation date
    pub last_run_date: Option<NaiveDate>,
    /// Inactive contracts are never selected for billing
    pub is_active: bool,
    /// Line templates
    pub lines: Vec<ContractLine>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Creates a new active contract whose first run falls on `start_date`
    pub fn new(
        tenant_id: TenantId,
        contract_number: impl Into<String>,
        customer_id: CustomerId,
        document_type_id: DocumentTypeId,
        interval: BillingInterval,
        start_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ContractId::new_v7(),
            tenant_id,
            contract_number: contract_number.into(),
            customer_id,
            document_type_id,
            payment_term_id: None,
            interval: interval.as_str().to_string(),
            start_date,
            end_date: None,
            next_run_date: start_date,
            last_run_date: None,
            is_active: true,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the end of the contract term
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Sets the payment term reference
    pub fn with_payment_term(mut self, id: PaymentTermId) -> Self {
        self.payment_term_id = Some(id);
        self
    }

    /// Overrides the next run date (e.g. to bill from a later period)
    pub fn with_next_run_date(mut self, date: NaiveDate) -> Self {
        self.next_run_date = date;
        self
    }

    /// Appends a line template
    pub fn add_line(&mut self, line: ContractLine) {
        self.lines.push(line);
        self.updated_at = Utc::now();
    }

    /// Resolves the stored interval token
    ///
    /// # Errors
    ///
    /// Returns `UnknownInterval` for values outside the supported set.
    pub fn billing_interval(&self) -> Result<BillingInterval, BillingError> {
        self.interval.parse()
    }

    /// Whether the contract is active by business definition on `date`
    pub fn is_in_term(&self, date: NaiveDate) -> bool {
        self.is_active && self.end_date.map_or(true, |end| date <= end)
    }

    /// Whether the contract is due for generation on `reference_date`
    pub fn is_due(&self, reference_date: NaiveDate) -> bool {
        self.is_active && self.next_run_date <= reference_date
    }

    /// Validates structural invariants
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.contract_number.trim().is_empty() {
            return Err(BillingError::validation("Contract number must not be empty"));
        }
        if self.next_run_date < self.start_date {
            return Err(BillingError::validation(format!(
                "Next run date {} is before start date {}",
                self.next_run_date, self.start_date
            )));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(BillingError::validation(format!(
                    "End date {} is before start date {}",
                    end, self.start_date
                )));
            }
        }
        self.billing_interval()?;
        Ok(())
    }

    /// Returns a copy with the schedule advanced by one interval
    ///
    /// `last_run_date` becomes the date just billed; `next_run_date` moves
    /// forward by the interval with end-of-month clamping.
    pub fn advanced(&self) -> Result<Contract, BillingError> {
        let interval = self.billing_interval()?;
        let mut next = self.clone();
        next.last_run_date = Some(self.next_run_date);
        next.next_run_date = interval.advance(self.next_run_date);
        next.updated_at = Utc::now();
        Ok(next)
    }
}
