//! Sales Document Domain
//!
//! This crate models multi-line sales documents (invoices, quotes, corrections)
//! and the deterministic totals calculation that keeps per-line amounts and
//! header totals in agreement.
//!
//! # Totals Invariants
//!
//! - Every amount is rounded to two decimals, HALF_UP, at each calculation step
//! - NORMAL lines always count toward document totals
//! - OPTIONAL and ALTERNATIVE lines count only while selected
//! - Header totals are plain sums of already-rounded line amounts
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_documents::{SalesDocument, SalesDocumentLine};
//!
//! let mut document = SalesDocument::new(tenant, doc_type, customer, "RE26-0001", issue_date);
//! document.add_line(SalesDocumentLine::new(1, "Hosting", qty, price, tax_rate));
//! assert_eq!(document.total_gross, expected);
//! ```

pub mod document;
pub mod document_type;
pub mod error;
pub mod terms;
pub mod totals;

pub use document::{DocumentStatus, LineType, SalesDocument, SalesDocumentLine};
pub use document_type::DocumentType;
pub use error::DocumentError;
pub use terms::PaymentTerm;
pub use totals::{calculate_totals, DocumentTotals, LineAmounts};
