//! Core types and data structures for the tax reporting engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier for a posting (one leg of a transaction)
pub type PostingId = i64;
/// Identifier for a transaction
pub type TransactionId = i64;
/// Identifier for a ledger account
pub type AccountId = i64;
/// Identifier for an actor (customer or supplier)
pub type ActorId = i64;

/// An exact amount of money: integer minor units tagged with a currency code.
///
/// Arithmetic never leaves the integer domain; two amounts are only ever
/// summed within the same currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Signed amount in minor units (e.g. cents)
    pub amount: i64,
    /// ISO 4217 currency code
    pub currency: String,
}

impl Money {
    /// Create a new money value
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// Sum money values per currency.
///
/// Output contains one entry per currency present, in insertion order of
/// first occurrence. Currencies with no entries are omitted.
pub fn sum_by_currency(entries: impl IntoIterator<Item = Money>) -> Vec<Money> {
    let mut sums: Vec<Money> = Vec::new();
    for entry in entries {
        match sums.iter_mut().find(|m| m.currency == entry.currency) {
            Some(existing) => existing.amount += entry.amount,
            None => sums.push(entry),
        }
    }
    sums
}

/// Types of entries in double-entry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Debit entry - increases Assets and Expenses, decreases Liabilities, Equity, and Income
    Debit,
    /// Credit entry - increases Liabilities, Equity, and Income, decreases Assets and Expenses
    Credit,
}

/// Account classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    Asset,
    /// Accounts receivable (asset group)
    Receivable,
    Liability,
    /// Accounts payable (liability group)
    Payable,
    Equity,
    Revenue,
    Expense,
}

/// A ledger account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub title: String,
    pub kind: AccountKind,
}

impl Account {
    /// Reserved account: accounts receivable. Invoice settlements post here.
    pub const ACCOUNTS_RECEIVABLE: AccountId = 10;
    /// Reserved account: accounts payable. Bill settlements post here.
    pub const ACCOUNTS_PAYABLE: AccountId = 30;

    /// Create a new account
    pub fn new(id: AccountId, title: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
        }
    }
}

/// Whether an actor buys from us or sells to us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Customer,
    Supplier,
}

/// A customer or supplier referenced by transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub title: String,
    pub kind: ActorKind,
}

impl Actor {
    /// Create a new actor
    pub fn new(id: ActorId, title: impl Into<String>, kind: ActorKind) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
        }
    }
}

/// Transaction types recognised by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Contribution,
    Dividend,
    Sale,
    Invoice,
    Purchase,
    Bill,
    Transfer,
    Journal,
}

impl TransactionType {
    /// Invoices and bills are recognised on settlement under cash accounting;
    /// every other type is recognised on its own date regardless of basis.
    pub fn is_accrual_type(&self) -> bool {
        matches!(self, TransactionType::Invoice | TransactionType::Bill)
    }
}

/// One leg of a double-entry transaction. Immutable once posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub id: PostingId,
    /// Parent transaction
    pub transaction_id: TransactionId,
    /// Account being affected
    pub account_id: AccountId,
    /// Debit or credit
    pub entry_type: EntryType,
    /// Amount in minor units
    pub amount: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Optional description for this specific posting
    pub description: Option<String>,
    /// Tax code, if this posting is a tax posting
    pub tax_code: Option<String>,
    /// Transaction this posting settles (payments against invoices/bills)
    pub settle_id: Option<TransactionId>,
    /// Posting this tax posting applies to (the taxed revenue/expense leg)
    pub parent_id: Option<PostingId>,
}

impl Posting {
    /// Whether this posting carries a non-empty tax code
    pub fn has_tax_code(&self) -> bool {
        self.tax_code.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Signed amount: debits positive, credits negative
    pub fn signed_amount(&self) -> i64 {
        match self.entry_type {
            EntryType::Debit => self.amount,
            EntryType::Credit => -self.amount,
        }
    }
}

/// Complete transaction with its postings.
///
/// Postings are assumed pre-validated: per currency, debits equal credits.
/// The engine reads transactions, it never validates or mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub txn_type: TransactionType,
    /// Date the transaction occurred (calendar date, no time component)
    pub date: NaiveDate,
    pub description: String,
    /// Customer or supplier involved
    pub actor_id: ActorId,
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// Create a new transaction without postings
    pub fn new(
        id: TransactionId,
        txn_type: TransactionType,
        date: NaiveDate,
        description: impl Into<String>,
        actor_id: ActorId,
    ) -> Self {
        Self {
            id,
            txn_type,
            date,
            description: description.into(),
            actor_id,
            postings: Vec::new(),
        }
    }

    /// Add a posting to the transaction
    pub fn add_posting(&mut self, posting: Posting) {
        self.postings.push(posting);
    }

    /// Per-currency debit balances: debits minus credits.
    ///
    /// A receivable is outstanding while its debit balance is positive;
    /// settled (or overpaid) at zero or below.
    pub fn debit_balances<'a>(postings: impl IntoIterator<Item = &'a Posting>) -> Vec<Money> {
        sum_by_currency(
            postings
                .into_iter()
                .map(|p| Money::new(p.signed_amount(), p.currency.clone())),
        )
    }

    /// Per-currency credit balances: credits minus debits.
    pub fn credit_balances<'a>(postings: impl IntoIterator<Item = &'a Posting>) -> Vec<Money> {
        sum_by_currency(
            postings
                .into_iter()
                .map(|p| Money::new(-p.signed_amount(), p.currency.clone())),
        )
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a date range, rejecting `end < start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> TaxResult<Self> {
        if end < start {
            return Err(TaxReportError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether the date falls within the range (inclusive on both ends)
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Errors that can occur while computing transaction taxes
#[derive(Debug, thiserror::Error)]
pub enum TaxReportError {
    #[error("invalid date range: {start} to {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid tax code: {0}")]
    InvalidTaxCode(String),
    #[error("inconsistent settlement data for transaction {txn_id}: {reason}")]
    InconsistentSettlement {
        txn_id: TransactionId,
        reason: String,
    },
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),
    #[error("store error: {0}")]
    Store(String),
}

impl TaxReportError {
    /// The ledger contains data the engine cannot compute correct totals
    /// from. Retrying without correcting the data will fail again.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            TaxReportError::InvalidTaxCode(_)
                | TaxReportError::InconsistentSettlement { .. }
                | TaxReportError::AccountNotFound(_)
                | TaxReportError::ActorNotFound(_)
                | TaxReportError::TransactionNotFound(_)
        )
    }

    /// The store itself failed; the query may succeed on retry.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, TaxReportError::Store(_))
    }
}

/// Result type for tax report operations
pub type TaxResult<T> = Result<T, TaxReportError>;
