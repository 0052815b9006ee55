//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CustomerId, DocumentTypeId, PaymentTermId, TaxRate, TenantId};
use domain_billing::{BillingInterval, Contract, ContractLine};

use crate::fixtures::{AmountFixtures, DateFixtures};

/// Builder for contract line templates
pub struct TestLineBuilder {
    position: u32,
    description: String,
    quantity: Decimal,
    unit_price_net: Decimal,
    tax_rate: TaxRate,
    discount_eligible: bool,
}

impl Default for TestLineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLineBuilder {
    /// Creates a builder for a 100.00 net line at the standard rate
    pub fn new() -> Self {
        Self {
            position: 1,
            description: "Web hosting".to_string(),
            quantity: dec!(1),
            unit_price_net: AmountFixtures::hundred(),
            tax_rate: AmountFixtures::standard_rate(),
            discount_eligible: true,
        }
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_unit_price(mut self, price: Decimal) -> Self {
        self.unit_price_net = price;
        self
    }

    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn without_discount(mut self) -> Self {
        self.discount_eligible = false;
        self
    }

    pub fn build(self) -> ContractLine {
        ContractLine::new(
            self.position,
            self.description,
            self.quantity,
            self.unit_price_net,
            self.tax_rate,
        )
        .with_discount_eligible(self.discount_eligible)
    }
}

/// Builder for recurring contracts
pub struct TestContractBuilder {
    tenant_id: TenantId,
    contract_number: String,
    customer_id: CustomerId,
    document_type_id: DocumentTypeId,
    payment_term_id: Option<PaymentTermId>,
    interval: BillingInterval,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    lines: Vec<ContractLine>,
}

impl TestContractBuilder {
    /// Creates a builder for a monthly contract starting Jan 1, 2026 with
    /// one standard line
    pub fn new(tenant_id: TenantId, document_type_id: DocumentTypeId) -> Self {
        Self {
            tenant_id,
            contract_number: "V26-0001".to_string(),
            customer_id: CustomerId::new(),
            document_type_id,
            payment_term_id: None,
            interval: BillingInterval::Monthly,
            start_date: DateFixtures::jan_1_2026(),
            end_date: None,
            lines: vec![TestLineBuilder::new().build()],
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.contract_number = number.into();
        self
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn with_payment_term(mut self, id: PaymentTermId) -> Self {
        self.payment_term_id = Some(id);
        self
    }

    pub fn with_interval(mut self, interval: BillingInterval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = date;
        self
    }

    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Replaces the default line set
    pub fn with_lines(mut self, lines: Vec<ContractLine>) -> Self {
        self.lines = lines;
        self
    }

    pub fn build(self) -> Contract {
        let mut contract = Contract::new(
            self.tenant_id,
            self.contract_number,
            self.customer_id,
            self.document_type_id,
            self.interval,
            self.start_date,
        );
        if let Some(end) = self.end_date {
            contract = contract.with_end_date(end);
        }
        if let Some(term) = self.payment_term_id {
            contract = contract.with_payment_term(term);
        }
        for line in self.lines {
            contract.add_line(line);
        }
        contract
    }
}
