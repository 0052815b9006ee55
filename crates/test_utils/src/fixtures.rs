//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities. Fixtures are consistent and
//! predictable so tests can assert on concrete numbers and dates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{TaxRate, TenantId};
use domain_documents::{DocumentType, PaymentTerm};

/// Fixture for date test data
pub struct DateFixtures;

impl DateFixtures {
    /// Standard billing epoch (Jan 1, 2026)
    pub fn jan_1_2026() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    /// A month-end date that forces clamping on advance (Jan 31, 2026)
    pub fn jan_31_2026() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    }

    /// Last allocation date of the year (Dec 31, 2026)
    pub fn year_end_2026() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
    }

    /// First allocation date of the next year (Jan 1, 2027)
    pub fn jan_1_2027() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
    }

    /// Arbitrary day from components
    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
}

/// Fixture for amount and rate test data
pub struct AmountFixtures;

impl AmountFixtures {
    /// Standard 19% tax rate
    pub fn standard_rate() -> TaxRate {
        TaxRate::new(dec!(0.19))
    }

    /// Reduced 7% tax rate
    pub fn reduced_rate() -> TaxRate {
        TaxRate::new(dec!(0.07))
    }

    /// A round net price that yields round tax at 19%
    pub fn hundred() -> Decimal {
        dec!(100.00)
    }

    /// A price that exercises half-up rounding at 19%
    pub fn rounding_price() -> Decimal {
        // 19% of 131.25 is 24.9375, rounding to 24.94
        dec!(131.25)
    }
}

/// Fixture for document type master data
pub struct DocumentTypeFixtures;

impl DocumentTypeFixtures {
    /// An active invoice type with prefix "RE" requiring a due date
    pub fn invoice(tenant: TenantId) -> DocumentType {
        DocumentType::new(tenant, "invoice", "Invoice", "RE")
            .unwrap()
            .invoice()
    }

    /// An active correction type with prefix "GS"
    pub fn credit_note(tenant: TenantId) -> DocumentType {
        DocumentType::new(tenant, "credit-note", "Credit Note", "GS")
            .unwrap()
            .correction()
    }

    /// A quotation-style type with prefix "AN" and no due date requirement
    pub fn quotation(tenant: TenantId) -> DocumentType {
        DocumentType::new(tenant, "quotation", "Quotation", "AN").unwrap()
    }
}

/// Fixture for payment term master data
pub struct PaymentTermFixtures;

impl PaymentTermFixtures {
    /// Net 14 days, no discount
    pub fn net_14() -> PaymentTerm {
        PaymentTerm::new("Net 14", 14)
    }

    /// Net 30 days with 2% discount within 10
    pub fn net_30_discounted() -> PaymentTerm {
        PaymentTerm::new("30/10 2%", 30)
            .with_discount(10, dec!(0.02))
            .unwrap()
    }
}
