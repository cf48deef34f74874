//! Read-only ledger store abstraction
//!
//! The engine never writes; it issues a small set of queries against
//! whatever backend holds the ledger (SQL, in-memory, remote service).
//! Implementing [`LedgerStore`] is enough to run the tax report against
//! any of them.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Which transactions the taxable-posting query should cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingSelection {
    /// Every transaction whose own date falls within the range (accrual)
    ByDate(DateRange),
    /// Cash accounting: invoices and bills restricted to the recognized
    /// set, every other transaction type by its own date
    CashBasis {
        range: DateRange,
        recognized: Vec<TransactionId>,
    },
}

/// A taxable posting joined with its parent transaction, account, actor and
/// (when linked) the posting it taxes. One row of the report's main query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedPosting {
    pub id: PostingId,
    pub description: Option<String>,
    pub entry_type: EntryType,
    pub amount: i64,
    pub currency: String,
    pub tax_code: String,

    // parent transaction
    pub txn_id: TransactionId,
    pub txn_type: TransactionType,
    pub txn_date: NaiveDate,
    pub txn_description: String,

    // customer / supplier
    pub actor_id: ActorId,
    pub actor_title: String,

    // revenue / expense account
    pub account_id: AccountId,
    pub account_title: String,
    pub account_kind: AccountKind,

    /// Amount of the posting this tax posting applies to (pre-tax base)
    pub parent_amount: i64,
    pub parent_description: Option<String>,
}

/// A settling posting together with the date of the payment transaction
/// it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEntry {
    pub posting: Posting,
    /// Date of the settling posting's parent transaction
    pub date: NaiveDate,
}

/// A transaction with its own postings plus everything that settles it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementView {
    pub transaction: Transaction,
    /// Settling postings ordered by settlement date ascending
    pub settlements: Vec<SettlementEntry>,
}

/// Query surface the tax engine needs from a ledger backend.
///
/// All methods are side-effect-free reads. Infrastructure failures should
/// surface as [`TaxReportError::Store`]; missing joined rows as the
/// corresponding not-found variant.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Postings with a non-empty tax code whose parent transaction matches
    /// the selection, joined with transaction, account, actor and parent
    /// posting.
    async fn taxable_postings(&self, selection: &PostingSelection)
        -> TaxResult<Vec<JoinedPosting>>;

    /// Invoice/Bill transactions with at least one settling posting whose
    /// parent transaction date falls within the range, in ascending id
    /// order.
    async fn settlement_candidates(&self, range: &DateRange) -> TaxResult<Vec<TransactionId>>;

    /// The transaction's own postings plus the postings that settle it,
    /// ordered by settling-transaction date ascending.
    async fn settlement_view(&self, txn_id: TransactionId) -> TaxResult<SettlementView>;
}
