//! Numbering Domain
//!
//! This crate allocates collision-free sequential document numbers. Each
//! (tenant, counter scope) pair owns one [`NumberRange`] row that is mutated
//! exclusively under a per-scope lock exposed by the [`NumberRangeStore`]
//! port.
//!
//! # Guarantees
//!
//! - Two concurrent callers on the same scope never observe the same sequence
//! - Allocation serializes per scope and is independent across scopes
//! - Under the `Yearly` reset policy the sequence restarts at 1 in a new year;
//!   under `Never` it is monotonic forever
//! - Lock acquisition is bounded; on expiry the caller gets `LockTimeout` and
//!   no partial state is left behind
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_numbering::{CounterScope, NumberAllocator};
//!
//! let allocator = NumberAllocator::new(store);
//! let number = allocator
//!     .allocate(tenant, CounterScope::DocumentType(invoice_type), "RE", issue_date)
//!     .await?;
//! assert_eq!(number, "RE26-0001");
//! ```

pub mod allocator;
pub mod error;
pub mod number_range;
pub mod ports;

pub use allocator::NumberAllocator;
pub use error::NumberingError;
pub use number_range::{CounterScope, NumberRange, RangeDefaults, ResetPolicy};
pub use ports::{NumberRangeStore, RangeGuard};
