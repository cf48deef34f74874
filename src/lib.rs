//! # Tax Report Core
//!
//! Transaction tax computation and aggregation engine for double-entry
//! ledgers: given a date range and an accounting basis, it determines which
//! postings count as taxable, resolves cash-basis settlement semantics, and
//! aggregates tax collected and paid per authority with exact per-currency
//! sums.
//!
//! ## Features
//!
//! - **Accrual and cash basis**: accrual recognises by transaction date;
//!   cash recognises invoices/bills only when fully settled, at the final
//!   settlement's date
//! - **Exact money**: integer minor-unit arithmetic, per-currency sums,
//!   no floating point
//! - **Authority aggregation**: output (collected) and input (paid) tax
//!   grouped per tax authority, deterministically ordered
//! - **Storage abstraction**: runs against any backend implementing the
//!   read-only [`LedgerStore`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use tax_report_core::{MemoryStore, TaxAuthorityRegistry, TaxReporter};
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tax_report_core::TaxReportError> {
//! let store = MemoryStore::with_reserved_accounts();
//! let reporter = TaxReporter::new(store, TaxAuthorityRegistry::with_defaults());
//!
//! let report = reporter
//!     .transaction_taxes(
//!         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
//!         true,
//!     )
//!     .await?;
//! assert!(report.authorities.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod report;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use report::*;
pub use tax::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_store::MemoryStore;
