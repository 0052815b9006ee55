//! Core Kernel - Foundational types and utilities for the billing engine
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Decimal rounding rules and tax rates for deterministic document totals
//! - Schedule date arithmetic (clamped month addition, two-digit years)
//! - Strongly-typed identifiers and common value objects

pub mod amounts;
pub mod identifiers;
pub mod schedule;

pub use amounts::{round_half_up, TaxRate};
pub use identifiers::{
    ContractId, ContractLineId, ContractRunId, CustomerId, DocumentId, DocumentLineId,
    DocumentTypeId, ItemId, NumberRangeId, PaymentTermId, TenantId,
};
pub use schedule::{add_months_clamped, two_digit_year};
