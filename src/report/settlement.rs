//! Cash-basis settlement resolution
//!
//! Under cash accounting, invoices and bills are only recognised once fully
//! paid, and then at the date of the final payment. Partial payments don't
//! count: an invoice partly paid inside the range and finished outside it is
//! excluded entirely.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::traits::{LedgerStore, SettlementView};
use crate::types::*;

/// Outcome of cash-basis settlement resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recognition {
    /// Recognised invoice/bill transactions mapped to their recognition
    /// date (the final settlement's date, overriding the transaction date)
    pub dates: BTreeMap<TransactionId, NaiveDate>,
    /// Candidates that had a payment inside the range but were not
    /// recognised. Counts both exclusion reasons: final settlement outside
    /// the range, and balances only partially cleared
    pub excluded_partial: usize,
}

impl Recognition {
    /// Transaction ids of the recognised set, ascending
    pub fn transaction_ids(&self) -> Vec<TransactionId> {
        self.dates.keys().copied().collect()
    }

    /// Recognition date for a transaction, if it was recognised
    pub fn date_for(&self, txn_id: TransactionId) -> Option<NaiveDate> {
        self.dates.get(&txn_id).copied()
    }
}

/// Decide which invoice/bill transactions are recognised within `range`
/// under cash accounting, and at which date.
///
/// Candidates are transactions with at least one settling posting dated
/// inside the range. A candidate is recognised only if its chronologically
/// last settlement falls inside the range *and* every per-currency balance
/// on the relevant receivable/payable account is settled (zero or overpaid).
pub async fn resolve_cash_recognition<S: LedgerStore>(
    store: &S,
    range: &DateRange,
) -> TaxResult<Recognition> {
    let candidates = store.settlement_candidates(range).await?;
    debug!(count = candidates.len(), "cash-basis settlement candidates");

    let mut recognition = Recognition::default();

    for txn_id in candidates {
        let view = store.settlement_view(txn_id).await?;

        let last = view.settlements.last().ok_or_else(|| {
            TaxReportError::InconsistentSettlement {
                txn_id,
                reason: "candidate has no settling postings".to_string(),
            }
        })?;

        // A partial payment inside the range does not qualify the
        // transaction if the final payment happened outside it.
        if !range.contains(last.date) {
            debug!(txn_id, settled = %last.date, "final settlement outside range, excluded");
            recognition.excluded_partial += 1;
            continue;
        }

        if is_fully_settled(&view, &last.posting)? {
            debug!(txn_id, recognized = %last.date, "fully settled, recognised");
            recognition.dates.insert(txn_id, last.date);
        } else {
            debug!(txn_id, "partially settled, excluded");
            recognition.excluded_partial += 1;
        }
    }

    Ok(recognition)
}

/// Whether the transaction's receivable/payable balances are fully cleared
/// by its settlements.
///
/// Balances run over the union of the transaction's own postings and all
/// settling postings, restricted to the account the final settlement posted
/// to. Every per-currency balance must be zero or below.
fn is_fully_settled(view: &SettlementView, final_settlement: &Posting) -> TaxResult<bool> {
    let txn_id = view.transaction.id;
    let account_id = final_settlement.account_id;

    let on_account = view
        .transaction
        .postings
        .iter()
        .chain(view.settlements.iter().map(|s| &s.posting))
        .filter(|p| p.account_id == account_id);

    let balances = match account_id {
        Account::ACCOUNTS_RECEIVABLE => Transaction::debit_balances(on_account),
        Account::ACCOUNTS_PAYABLE => Transaction::credit_balances(on_account),
        other => {
            return Err(TaxReportError::InconsistentSettlement {
                txn_id,
                reason: format!("settling posting hit unexpected account {other}"),
            })
        }
    };

    Ok(balances.iter().all(|b| b.amount <= 0))
}
