//! Billing Domain - Recurring Contract Billing
//!
//! This crate turns active recurring contracts into draft sales documents on
//! a cadence, while keeping an immutable, idempotent run history.
//!
//! # Guarantees
//!
//! - At most one [`ContractRun`] ever exists per (contract, run date); a
//!   repeated invocation for the same period returns the existing record
//! - A contract's generation is all-or-nothing: a failure rolls back the
//!   document, the run record, and the schedule advance together, and the
//!   failure itself is recorded durably afterwards
//! - One contract's failure never blocks the rest of the batch
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::BillingScheduler;
//!
//! let scheduler = BillingScheduler::new(store, document_types, payment_terms, allocator);
//! let runs = scheduler.run_due_billing(tenant, reference_date).await?;
//! for run in &runs {
//!     println!("{}: {:?}", run.contract_id, run.status);
//! }
//! ```

pub mod contract;
pub mod error;
pub mod ports;
pub mod run;
pub mod scheduler;
pub mod service;

pub use contract::{BillingInterval, Contract, ContractLine};
pub use error::BillingError;
pub use ports::{BillingStore, DocumentTypeSource, PaymentTermSource, StoreError};
pub use run::{ContractRun, RunStatus};
pub use scheduler::BillingScheduler;
pub use service::{ContractService, NewContract};
