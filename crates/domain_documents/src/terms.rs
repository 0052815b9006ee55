//! Payment terms
//!
//! Payment terms are customer master data supplied by a collaborator. The
//! engine uses them at document-creation time only: the due date and a
//! human-readable text are snapshotted onto the document and never re-read.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::PaymentTermId;

use crate::error::DocumentError;

/// A payment term definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTerm {
    /// Unique identifier
    pub id: PaymentTermId,
    /// Display name (e.g. "Net 14")
    pub name: String,
    /// Days until the full amount is due
    pub net_days: u32,
    /// Days within which the early-payment discount applies
    pub discount_days: Option<u32>,
    /// Early-payment discount rate as a fraction (e.g. 0.02)
    pub discount_rate: Option<Decimal>,
}

impl PaymentTerm {
    /// Creates a payment term without an early-payment discount
    pub fn new(name: impl Into<String>, net_days: u32) -> Self {
        Self {
            id: PaymentTermId::new_v7(),
            name: name.into(),
            net_days,
            discount_days: None,
            discount_rate: None,
        }
    }

    /// Adds an early-payment discount
    ///
    /// # Errors
    ///
    /// Returns a validation error if the discount window exceeds the net
    /// window or the rate is not a positive fraction below 1.
    pub fn with_discount(mut self, days: u32, rate: Decimal) -> Result<Self, DocumentError> {
        if days > self.net_days {
            return Err(DocumentError::validation(format!(
                "Discount window of {} days exceeds net {} days",
                days, self.net_days
            )));
        }
        if rate <= Decimal::ZERO || rate >= Decimal::ONE {
            return Err(DocumentError::validation(format!(
                "Discount rate {} must be between 0 and 1 exclusive",
                rate
            )));
        }
        self.discount_days = Some(days);
        self.discount_rate = Some(rate);
        Ok(self)
    }

    /// Computes the due date for a document issued on `issue_date`
    pub fn due_date(&self, issue_date: NaiveDate) -> NaiveDate {
        issue_date
            .checked_add_days(Days::new(self.net_days as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Renders the human-readable snapshot text stored on documents
    pub fn snapshot_text(&self) -> String {
        match (self.discount_days, self.discount_rate) {
            (Some(days), Some(rate)) => format!(
                "Payable within {} days; {}% discount within {} days",
                self.net_days,
                (rate * Decimal::ONE_HUNDRED).normalize(),
                days
            ),
            _ => format!("Payable within {} days", self.net_days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_due_date_adds_net_days() {
        let term = PaymentTerm::new("Net 30", 30);
        let due = term.due_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(due, NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
    }

    #[test]
    fn test_snapshot_text_without_discount() {
        let term = PaymentTerm::new("Net 14", 14);
        assert_eq!(term.snapshot_text(), "Payable within 14 days");
    }

    #[test]
    fn test_snapshot_text_with_discount() {
        let term = PaymentTerm::new("14/7 2%", 14).with_discount(7, dec!(0.02)).unwrap();
        assert_eq!(
            term.snapshot_text(),
            "Payable within 14 days; 2% discount within 7 days"
        );
    }

    #[test]
    fn test_discount_window_must_fit_net_window() {
        let result = PaymentTerm::new("Net 7", 7).with_discount(10, dec!(0.02));
        assert!(matches!(result, Err(DocumentError::Validation(_))));
    }

    #[test]
    fn test_discount_rate_bounds() {
        assert!(PaymentTerm::new("Net 14", 14).with_discount(7, dec!(0)).is_err());
        assert!(PaymentTerm::new("Net 14", 14).with_discount(7, dec!(1)).is_err());
        assert!(PaymentTerm::new("Net 14", 14).with_discount(7, dec!(0.03)).is_ok());
    }
}
