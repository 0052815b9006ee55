//! Repository implementations for domain entities
//!
//! This module provides concrete repository implementations that handle
//! database access for each domain aggregate. Repositories encapsulate
//! SQL queries and map between database rows and domain types.
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Tenant scoping on every query that touches tenant-owned data
//! - Transaction support for multi-row writes
//! - Runtime-bound queries so the crate builds without a live database

pub mod billing;
pub mod numbering;

pub use billing::BillingRepository;
pub use numbering::NumberingRepository;
