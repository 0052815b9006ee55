//! Sales documents and their lines
//!
//! A sales document is a tenant-scoped header with an ordered collection of
//! lines. Prices and tax rates on a line are snapshots taken at creation time
//! and are never re-derived from the item catalog. Header totals are
//! denormalized and recomputed whenever the lines change.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    CustomerId, DocumentId, DocumentLineId, DocumentTypeId, ItemId, TaxRate, TenantId,
};

use crate::document_type::DocumentType;
use crate::error::DocumentError;
use crate::terms::PaymentTerm;
use crate::totals::calculate_totals;

/// Lifecycle status of a sales document
///
/// The engine only ever creates documents in `Draft`; everything after that
/// belongs to the downstream workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Draft,
    Issued,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Issued => "issued",
            DocumentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DocumentStatus::Draft),
            "issued" => Ok(DocumentStatus::Issued),
            "cancelled" => Ok(DocumentStatus::Cancelled),
            other => Err(DocumentError::validation(format!(
                "Unknown document status '{}'",
                other
            ))),
        }
    }
}

/// How a line participates in document totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineType {
    /// Always counted, irrespective of selection
    Normal,
    /// Counted only while selected
    Optional,
    /// An alternative to another line, counted only while selected
    Alternative,
}

impl LineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineType::Normal => "normal",
            LineType::Optional => "optional",
            LineType::Alternative => "alternative",
        }
    }
}

impl FromStr for LineType {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(LineType::Normal),
            "optional" => Ok(LineType::Optional),
            "alternative" => Ok(LineType::Alternative),
            other => Err(DocumentError::validation(format!(
                "Unknown line type '{}'",
                other
            ))),
        }
    }
}

/// A single line on a sales document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesDocumentLine {
    /// Unique identifier
    pub id: DocumentLineId,
    /// 1-based position within the document
    pub position: u32,
    /// Item master-data reference, if the line came from the catalog
    pub item_id: Option<ItemId>,
    /// Description snapshot
    pub description: String,
    /// Totals participation
    pub line_type: LineType,
    /// Selection flag for optional/alternative lines
    pub is_selected: bool,
    /// Quantity; negative on corrections
    pub quantity: Decimal,
    /// Net unit price snapshot
    pub unit_price_net: Decimal,
    /// Tax rate snapshot
    pub tax_rate: TaxRate,
    /// Whether early-payment discount applies to this line
    pub discount_eligible: bool,
    /// Computed net amount
    pub line_net: Decimal,
    /// Computed tax amount
    pub line_tax: Decimal,
    /// Computed gross amount
    pub line_gross: Decimal,
}

impl SalesDocumentLine {
    /// Creates a new NORMAL, selected line with zeroed computed amounts
    ///
    /// Amounts are filled in by [`SalesDocument::recalculate_totals`].
    pub fn new(
        position: u32,
        description: impl Into<String>,
        quantity: Decimal,
        unit_price_net: Decimal,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            id: DocumentLineId::new_v7(),
            position,
            item_id: None,
            description: description.into(),
            line_type: LineType::Normal,
            is_selected: true,
            quantity,
            unit_price_net,
            tax_rate,
            discount_eligible: true,
            line_net: Decimal::ZERO,
            line_tax: Decimal::ZERO,
            line_gross: Decimal::ZERO,
        }
    }

    /// Sets the item reference
    pub fn with_item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    /// Sets the line type
    pub fn with_line_type(mut self, line_type: LineType) -> Self {
        self.line_type = line_type;
        self
    }

    /// Sets the selection flag
    pub fn with_selection(mut self, is_selected: bool) -> Self {
        self.is_selected = is_selected;
        self
    }

    /// Sets discount eligibility
    pub fn with_discount_eligible(mut self, eligible: bool) -> Self {
        self.discount_eligible = eligible;
        self
    }

    /// Whether this line counts toward document totals
    pub fn counts_toward_totals(&self) -> bool {
        matches!(self.line_type, LineType::Normal) || self.is_selected
    }
}

/// A sales document header with its ordered lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesDocument {
    /// Unique identifier
    pub id: DocumentId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Document type reference
    pub document_type_id: DocumentTypeId,
    /// Allocated document number (e.g. "RE26-0001")
    pub number: String,
    /// Lifecycle status
    pub status: DocumentStatus,
    /// Billed customer
    pub customer_id: CustomerId,
    /// Source document, set on corrections
    pub source_document_id: Option<DocumentId>,
    /// Issue date
    pub issue_date: NaiveDate,
    /// Due date, computed from the payment term at creation
    pub due_date: Option<NaiveDate>,
    /// Human-readable payment term snapshot
    pub payment_term_text: Option<String>,
    /// Sum of included lines' net amounts
    pub total_net: Decimal,
    /// Sum of included lines' tax amounts
    pub total_tax: Decimal,
    /// Sum of included lines' gross amounts
    pub total_gross: Decimal,
    /// Ordered lines
    pub lines: Vec<SalesDocumentLine>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl SalesDocument {
    /// Creates a new draft document with no lines and zero totals
    pub fn new(
        tenant_id: TenantId,
        document_type_id: DocumentTypeId,
        customer_id: CustomerId,
        number: impl Into<String>,
        issue_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new_v7(),
            tenant_id,
            document_type_id,
            number: number.into(),
            status: DocumentStatus::Draft,
            customer_id,
            source_document_id: None,
            issue_date,
            due_date: None,
            payment_term_text: None,
            total_net: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            total_gross: Decimal::ZERO,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks this document as a correction of `source`
    pub fn correcting(mut self, source: DocumentId) -> Self {
        self.source_document_id = Some(source);
        self
    }

    /// Appends a line and recomputes all totals
    pub fn add_line(&mut self, line: SalesDocumentLine) {
        self.lines.push(line);
        self.recalculate_totals();
    }

    /// Replaces all lines and recomputes all totals
    pub fn set_lines(&mut self, lines: Vec<SalesDocumentLine>) {
        self.lines = lines;
        self.recalculate_totals();
    }

    /// Applies a payment term: due date and text snapshot
    ///
    /// Both values are frozen at this instant and never re-derived from the
    /// payment term master data.
    pub fn apply_payment_term(&mut self, term: &PaymentTerm) {
        self.due_date = Some(term.due_date(self.issue_date));
        self.payment_term_text = Some(term.snapshot_text());
        self.updated_at = Utc::now();
    }

    /// Makes the document due on receipt
    ///
    /// Used when no payment term applies: the due date equals the issue
    /// date, satisfying types that require one.
    pub fn due_on_receipt(&mut self) {
        self.due_date = Some(self.issue_date);
        self.payment_term_text = Some("Due upon receipt".to_string());
        self.updated_at = Utc::now();
    }

    /// Recomputes per-line amounts and header totals from the current lines
    ///
    /// Amounts are written back onto every line, included or not; only
    /// included lines contribute to the header sums.
    pub fn recalculate_totals(&mut self) {
        let totals = calculate_totals(&self.lines);
        for (line, amounts) in self.lines.iter_mut().zip(&totals.lines) {
            line.line_net = amounts.net;
            line.line_tax = amounts.tax;
            line.line_gross = amounts.gross;
        }
        self.total_net = totals.total_net;
        self.total_tax = totals.total_tax;
        self.total_gross = totals.total_gross;
        self.updated_at = Utc::now();
    }

    /// Validates structural invariants against the document's type
    ///
    /// Raised before any write; a failing document is never persisted.
    pub fn validate(&self, document_type: &DocumentType) -> Result<(), DocumentError> {
        if self.number.trim().is_empty() {
            return Err(DocumentError::validation("Document number must not be empty"));
        }
        if document_type.requires_due_date && self.due_date.is_none() {
            return Err(DocumentError::MissingDueDate(document_type.key.clone()));
        }
        if document_type.is_correction && self.source_document_id.is_none() {
            return Err(DocumentError::CorrectionWithoutSource(self.number.clone()));
        }
        if let Some(due) = self.due_date {
            if due < self.issue_date {
                return Err(DocumentError::validation(format!(
                    "Due date {} is before issue date {}",
                    due, self.issue_date
                )));
            }
        }
        Ok(())
    }
}
