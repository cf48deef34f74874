//! In-memory ledger store for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory [`LedgerStore`] implementation.
///
/// Performs the joins, the correlated settlement-existence scan and the
/// ordered settlement fetch over plain hash maps. Useful for tests and as a
/// reference for what a SQL-backed store must return.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
    actors: Arc<RwLock<HashMap<ActorId, Actor>>>,
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with the reserved receivable/payable
    /// accounts
    pub fn with_reserved_accounts() -> Self {
        let store = Self::new();
        store.insert_account(Account::new(
            Account::ACCOUNTS_RECEIVABLE,
            "Accounts Receivable",
            AccountKind::Receivable,
        ));
        store.insert_account(Account::new(
            Account::ACCOUNTS_PAYABLE,
            "Accounts Payable",
            AccountKind::Payable,
        ));
        store
    }

    /// Insert or replace an account
    pub fn insert_account(&self, account: Account) {
        self.accounts.write().unwrap().insert(account.id, account);
    }

    /// Insert or replace an actor
    pub fn insert_actor(&self, actor: Actor) {
        self.actors.write().unwrap().insert(actor.id, actor);
    }

    /// Insert or replace a transaction with its postings
    pub fn insert_transaction(&self, transaction: Transaction) {
        self.transactions
            .write()
            .unwrap()
            .insert(transaction.id, transaction);
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.accounts.write().unwrap().clear();
        self.actors.write().unwrap().clear();
        self.transactions.write().unwrap().clear();
    }

    fn matches_selection(txn: &Transaction, selection: &PostingSelection) -> bool {
        match selection {
            PostingSelection::ByDate(range) => range.contains(txn.date),
            PostingSelection::CashBasis { range, recognized } => {
                if txn.txn_type.is_accrual_type() {
                    recognized.contains(&txn.id)
                } else {
                    range.contains(txn.date)
                }
            }
        }
    }

    fn join_posting(
        &self,
        txn: &Transaction,
        posting: &Posting,
    ) -> TaxResult<JoinedPosting> {
        let accounts = self.accounts.read().unwrap();
        let actors = self.actors.read().unwrap();

        let account = accounts
            .get(&posting.account_id)
            .ok_or(TaxReportError::AccountNotFound(posting.account_id))?;
        let actor = actors
            .get(&txn.actor_id)
            .ok_or(TaxReportError::ActorNotFound(txn.actor_id))?;

        // Left-join semantics on the parent link: a tax posting without a
        // parent contributes zero to the pre-tax totals.
        let parent = posting
            .parent_id
            .and_then(|pid| txn.postings.iter().find(|p| p.id == pid));

        Ok(JoinedPosting {
            id: posting.id,
            description: posting.description.clone(),
            entry_type: posting.entry_type,
            amount: posting.amount,
            currency: posting.currency.clone(),
            tax_code: posting.tax_code.clone().unwrap_or_default(),
            txn_id: txn.id,
            txn_type: txn.txn_type,
            txn_date: txn.date,
            txn_description: txn.description.clone(),
            actor_id: actor.id,
            actor_title: actor.title.clone(),
            account_id: account.id,
            account_title: account.title.clone(),
            account_kind: account.kind,
            parent_amount: parent.map(|p| p.amount).unwrap_or(0),
            parent_description: parent.and_then(|p| p.description.clone()),
        })
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn taxable_postings(
        &self,
        selection: &PostingSelection,
    ) -> TaxResult<Vec<JoinedPosting>> {
        let transactions = self.transactions.read().unwrap();

        let mut txns: Vec<&Transaction> = transactions
            .values()
            .filter(|txn| Self::matches_selection(txn, selection))
            .collect();
        txns.sort_by_key(|txn| txn.id);

        let mut rows = Vec::new();
        for txn in txns {
            for posting in txn.postings.iter().filter(|p| p.has_tax_code()) {
                rows.push(self.join_posting(txn, posting)?);
            }
        }
        Ok(rows)
    }

    async fn settlement_candidates(&self, range: &DateRange) -> TaxResult<Vec<TransactionId>> {
        let transactions = self.transactions.read().unwrap();

        let mut candidates: Vec<TransactionId> = transactions
            .values()
            .filter(|txn| txn.txn_type.is_accrual_type())
            .filter(|txn| {
                transactions.values().any(|other| {
                    range.contains(other.date)
                        && other.postings.iter().any(|p| p.settle_id == Some(txn.id))
                })
            })
            .map(|txn| txn.id)
            .collect();
        candidates.sort_unstable();
        Ok(candidates)
    }

    async fn settlement_view(&self, txn_id: TransactionId) -> TaxResult<SettlementView> {
        let transactions = self.transactions.read().unwrap();

        let transaction = transactions
            .get(&txn_id)
            .cloned()
            .ok_or(TaxReportError::TransactionNotFound(txn_id))?;

        let mut settlements: Vec<SettlementEntry> = transactions
            .values()
            .flat_map(|other| {
                other
                    .postings
                    .iter()
                    .filter(|p| p.settle_id == Some(txn_id))
                    .map(|p| SettlementEntry {
                        posting: p.clone(),
                        date: other.date,
                    })
            })
            .collect();
        settlements.sort_by_key(|s| (s.date, s.posting.id));

        Ok(SettlementView {
            transaction,
            settlements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    fn posting(id: PostingId, txn: TransactionId, account_id: AccountId) -> Posting {
        Posting {
            id,
            transaction_id: txn,
            account_id,
            entry_type: EntryType::Debit,
            amount: 1000,
            currency: "USD".to_string(),
            description: None,
            tax_code: None,
            settle_id: None,
            parent_id: None,
        }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::with_reserved_accounts();
        store.insert_account(Account::new(400, "Sales", AccountKind::Revenue));
        store.insert_account(Account::new(50, "GST Payable", AccountKind::Liability));
        store.insert_actor(Actor::new(1, "Acme Pty Ltd", ActorKind::Customer));
        store
    }

    #[tokio::test]
    async fn test_taxable_postings_joins_and_filters() {
        let store = seeded_store();

        let mut invoice =
            Transaction::new(1, TransactionType::Invoice, date(2024, 1, 5), "Invoice #1", 1);
        invoice.add_posting(posting(1, 1, Account::ACCOUNTS_RECEIVABLE));
        let mut revenue = posting(2, 1, 400);
        revenue.entry_type = EntryType::Credit;
        revenue.amount = 10000;
        invoice.add_posting(revenue);
        let mut tax = posting(3, 1, 50);
        tax.entry_type = EntryType::Credit;
        tax.amount = 1000;
        tax.tax_code = Some("AU:GST:10".to_string());
        tax.parent_id = Some(2);
        invoice.add_posting(tax);
        store.insert_transaction(invoice);

        let rows = store
            .taxable_postings(&PostingSelection::ByDate(range(
                date(2024, 1, 1),
                date(2024, 1, 31),
            )))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, 3);
        assert_eq!(row.tax_code, "AU:GST:10");
        assert_eq!(row.account_title, "GST Payable");
        assert_eq!(row.actor_title, "Acme Pty Ltd");
        assert_eq!(row.parent_amount, 10000);
    }

    #[tokio::test]
    async fn test_taxable_postings_missing_account() {
        let store = MemoryStore::new();
        store.insert_actor(Actor::new(1, "Acme", ActorKind::Customer));

        let mut txn = Transaction::new(1, TransactionType::Sale, date(2024, 1, 5), "Sale", 1);
        let mut tax = posting(1, 1, 999);
        tax.tax_code = Some("AU:GST:10".to_string());
        txn.add_posting(tax);
        store.insert_transaction(txn);

        let err = store
            .taxable_postings(&PostingSelection::ByDate(range(
                date(2024, 1, 1),
                date(2024, 1, 31),
            )))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxReportError::AccountNotFound(999)));
    }

    #[tokio::test]
    async fn test_settlement_candidates_correlated_existence() {
        let store = seeded_store();

        let mut invoice =
            Transaction::new(1, TransactionType::Invoice, date(2023, 12, 20), "Invoice", 1);
        invoice.add_posting(posting(1, 1, Account::ACCOUNTS_RECEIVABLE));
        store.insert_transaction(invoice);

        // Payment inside the range settles invoice 1
        let mut payment =
            Transaction::new(2, TransactionType::Journal, date(2024, 1, 15), "Payment", 1);
        let mut settle = posting(2, 2, Account::ACCOUNTS_RECEIVABLE);
        settle.entry_type = EntryType::Credit;
        settle.settle_id = Some(1);
        payment.add_posting(settle);
        store.insert_transaction(payment);

        // Invoice without any settlement is never a candidate
        let mut unpaid =
            Transaction::new(3, TransactionType::Invoice, date(2024, 1, 10), "Unpaid", 1);
        unpaid.add_posting(posting(3, 3, Account::ACCOUNTS_RECEIVABLE));
        store.insert_transaction(unpaid);

        let candidates = store
            .settlement_candidates(&range(date(2024, 1, 1), date(2024, 1, 31)))
            .await
            .unwrap();
        assert_eq!(candidates, vec![1]);

        // No candidates when the payment falls outside the range
        let candidates = store
            .settlement_candidates(&range(date(2024, 2, 1), date(2024, 2, 29)))
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_settlement_view_ordering() {
        let store = seeded_store();

        let mut invoice =
            Transaction::new(1, TransactionType::Invoice, date(2023, 12, 20), "Invoice", 1);
        invoice.add_posting(posting(1, 1, Account::ACCOUNTS_RECEIVABLE));
        store.insert_transaction(invoice);

        // Inserted out of date order on purpose
        for (txn_id, posting_id, day) in [(2, 10, 20), (3, 11, 5)] {
            let mut payment = Transaction::new(
                txn_id,
                TransactionType::Journal,
                date(2024, 1, day),
                "Payment",
                1,
            );
            let mut settle = posting(posting_id, txn_id, Account::ACCOUNTS_RECEIVABLE);
            settle.entry_type = EntryType::Credit;
            settle.settle_id = Some(1);
            payment.add_posting(settle);
            store.insert_transaction(payment);
        }

        let view = store.settlement_view(1).await.unwrap();
        assert_eq!(view.transaction.id, 1);
        let dates: Vec<_> = view.settlements.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 5), date(2024, 1, 20)]);
    }

    #[tokio::test]
    async fn test_settlement_view_missing_transaction() {
        let store = MemoryStore::new();
        let err = store.settlement_view(42).await.unwrap_err();
        assert!(matches!(err, TaxReportError::TransactionNotFound(42)));
    }
}
