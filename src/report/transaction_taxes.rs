//! Transaction tax aggregation
//!
//! Produces, for a date range and accounting basis, the taxes collected
//! (outputs) and paid (inputs) per tax authority, with exact per-currency
//! totals. This is the data behind the tax summary report; rendering it is
//! someone else's job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::report::settlement::{resolve_cash_recognition, Recognition};
use crate::tax::{TaxAuthority, TaxAuthorityRegistry, TaxCodeInfo};
use crate::traits::{JoinedPosting, LedgerStore, PostingSelection};
use crate::types::*;

/// A taxable posting denormalised for reporting: the joined row plus its
/// resolved tax classification. `txn_date` is the effective recognition
/// date (settlement date for cash-basis invoices/bills).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
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

    /// Pre-tax amount of the posting this tax applies to
    pub parent_amount: i64,
    pub parent_description: Option<String>,

    // the tax posting itself
    pub id: PostingId,
    pub description: Option<String>,
    pub entry_type: EntryType,
    pub amount: i64,
    pub currency: String,
    pub tax_code: String,

    /// Resolved classification of `tax_code`
    pub tax_info: TaxCodeInfo,
}

impl Item {
    fn from_row(row: JoinedPosting, tax_info: TaxCodeInfo) -> Self {
        Self {
            txn_id: row.txn_id,
            txn_type: row.txn_type,
            txn_date: row.txn_date,
            txn_description: row.txn_description,
            actor_id: row.actor_id,
            actor_title: row.actor_title,
            account_id: row.account_id,
            account_title: row.account_title,
            account_kind: row.account_kind,
            parent_amount: row.parent_amount,
            parent_description: row.parent_description,
            id: row.id,
            description: row.description,
            entry_type: row.entry_type,
            amount: row.amount,
            currency: row.currency,
            tax_code: row.tax_code,
            tax_info,
        }
    }
}

/// Items sharing an (authority, direction) bucket, with their totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub items: Vec<Item>,
    /// Tax amounts summed per currency
    pub tax_totals: Vec<Money>,
    /// Pre-tax (parent) amounts summed per currency
    pub totals: Vec<Money>,
}

impl Group {
    fn recompute_totals(&mut self) {
        self.tax_totals = sum_by_currency(
            self.items
                .iter()
                .map(|i| Money::new(i.amount, i.currency.clone())),
        );
        self.totals = sum_by_currency(
            self.items
                .iter()
                .map(|i| Money::new(i.parent_amount, i.currency.clone())),
        );
    }
}

/// One tax authority's aggregated output and input tax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub authority: TaxAuthority,
    /// Authority id, denormalised for consumers
    pub id: String,
    /// Region name, denormalised for consumers
    pub region: String,
    /// Credit-side items: tax collected
    pub outputs: Group,
    /// Debit-side items: tax paid
    pub inputs: Group,
}

/// Complete result of a transaction tax query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTaxes {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub accrual: bool,
    /// Divisions sorted by region name ascending
    pub authorities: Vec<Division>,
    /// Invoices/bills with an in-range payment that were nevertheless not
    /// recognised (cash basis only): either their final settlement fell
    /// outside the range or their balances were only partially cleared
    pub excluded_partial: usize,
}

/// The tax computation engine: a ledger store plus the authority registry.
///
/// Stateless across invocations; repeated calls with identical parameters
/// against an unchanged store return identical results.
pub struct TaxReporter<S: LedgerStore> {
    store: S,
    registry: TaxAuthorityRegistry,
}

impl<S: LedgerStore> TaxReporter<S> {
    /// Create a new reporter over the given store and authority registry
    pub fn new(store: S, registry: TaxAuthorityRegistry) -> Self {
        Self { store, registry }
    }

    /// Compute transaction taxes for the inclusive date range.
    ///
    /// `accrual = true` recognises every transaction by its own date;
    /// `accrual = false` applies cash-basis settlement semantics to
    /// invoices and bills.
    pub async fn transaction_taxes(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        accrual: bool,
    ) -> TaxResult<TransactionTaxes> {
        let range = DateRange::new(start_date, end_date)?;
        let (items, recognition) = self.tax_items_with_recognition(&range, accrual).await?;

        let mut authorities = build_divisions(items);
        authorities.sort_by(|a, b| a.region.cmp(&b.region));
        for division in &mut authorities {
            division.outputs.recompute_totals();
            division.inputs.recompute_totals();
        }

        debug!(
            %start_date,
            %end_date,
            accrual,
            divisions = authorities.len(),
            "transaction taxes computed"
        );

        Ok(TransactionTaxes {
            start_date,
            end_date,
            accrual,
            authorities,
            excluded_partial: recognition.excluded_partial,
        })
    }

    /// Fetch, date-resolve, sort and classify the taxable postings for the
    /// range, without aggregating them.
    ///
    /// Items come back sorted by (date, transaction id), the order that
    /// feeds division discovery and per-currency totals.
    pub async fn tax_items(&self, range: &DateRange, accrual: bool) -> TaxResult<Vec<Item>> {
        let (items, _) = self.tax_items_with_recognition(range, accrual).await?;
        Ok(items)
    }

    async fn tax_items_with_recognition(
        &self,
        range: &DateRange,
        accrual: bool,
    ) -> TaxResult<(Vec<Item>, Recognition)> {
        let (selection, recognition) = if accrual {
            (PostingSelection::ByDate(*range), Recognition::default())
        } else {
            let recognition = resolve_cash_recognition(&self.store, range).await?;
            let selection = PostingSelection::CashBasis {
                range: *range,
                recognized: recognition.transaction_ids(),
            };
            (selection, recognition)
        };

        let mut rows = self.store.taxable_postings(&selection).await?;
        debug!(rows = rows.len(), accrual, "taxable postings fetched");

        // Recognised invoices/bills carry the settlement date downstream,
        // not their stored transaction date.
        for row in &mut rows {
            if let Some(date) = recognition.date_for(row.txn_id) {
                row.txn_date = date;
            }
        }

        // Tie-break on transaction id so colliding dates still order
        // deterministically.
        rows.sort_by(|a, b| (a.txn_date, a.txn_id).cmp(&(b.txn_date, b.txn_id)));

        let items = rows
            .into_iter()
            .map(|row| {
                let tax_info = self.registry.resolve(&row.tax_code)?;
                Ok(Item::from_row(row, tax_info))
            })
            .collect::<TaxResult<Vec<Item>>>()?;

        Ok((items, recognition))
    }
}

/// Bucket items into one division per authority, discovered lazily in item
/// order. Credit items are output tax, debit items input tax.
fn build_divisions(items: Vec<Item>) -> Vec<Division> {
    let mut divisions: Vec<Division> = Vec::new();

    for item in items {
        let index = match divisions.iter().position(|d| d.id == item.tax_info.authority) {
            Some(index) => index,
            None => {
                divisions.push(Division {
                    authority: TaxAuthority::new(
                        item.tax_info.authority.clone(),
                        item.tax_info.region_name.clone(),
                    ),
                    id: item.tax_info.authority.clone(),
                    region: item.tax_info.region_name.clone(),
                    outputs: Group::default(),
                    inputs: Group::default(),
                });
                divisions.len() - 1
            }
        };
        let division = &mut divisions[index];

        match item.entry_type {
            EntryType::Credit => division.outputs.items.push(item),
            EntryType::Debit => division.inputs.items.push(item),
        }
    }

    divisions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(
        id: PostingId,
        authority: &str,
        region: &str,
        entry_type: EntryType,
        amount: i64,
        parent_amount: i64,
        currency: &str,
    ) -> Item {
        Item {
            txn_id: id,
            txn_type: TransactionType::Sale,
            txn_date: date(2024, 1, 1),
            txn_description: "Sale".to_string(),
            actor_id: 1,
            actor_title: "Acme".to_string(),
            account_id: 400,
            account_title: "Sales".to_string(),
            account_kind: AccountKind::Revenue,
            parent_amount,
            parent_description: None,
            id,
            description: None,
            entry_type,
            amount,
            currency: currency.to_string(),
            tax_code: format!("{authority}:GST:10"),
            tax_info: TaxCodeInfo {
                code: format!("{authority}:GST:10"),
                authority: authority.to_string(),
                region_name: region.to_string(),
                tax_type: "GST".to_string(),
                rate: Some("10".to_string()),
            },
        }
    }

    #[test]
    fn test_build_divisions_direction_split() {
        let divisions = build_divisions(vec![
            item(1, "AU", "Australia", EntryType::Credit, 1000, 10000, "AUD"),
            item(2, "AU", "Australia", EntryType::Debit, 500, 5000, "AUD"),
        ]);

        assert_eq!(divisions.len(), 1);
        assert_eq!(divisions[0].outputs.items.len(), 1);
        assert_eq!(divisions[0].inputs.items.len(), 1);
    }

    #[test]
    fn test_group_totals_substitute_parent_amount() {
        let mut group = Group {
            items: vec![
                item(1, "AU", "Australia", EntryType::Credit, 1000, 10000, "AUD"),
                item(2, "AU", "Australia", EntryType::Credit, 2000, 20000, "AUD"),
                item(3, "AU", "Australia", EntryType::Credit, 300, 3000, "USD"),
            ],
            ..Group::default()
        };
        group.recompute_totals();

        assert_eq!(
            group.tax_totals,
            vec![Money::new(3000, "AUD"), Money::new(300, "USD")]
        );
        assert_eq!(
            group.totals,
            vec![Money::new(30000, "AUD"), Money::new(3000, "USD")]
        );
    }

    #[test]
    fn test_recompute_totals_idempotent() {
        let mut group = Group {
            items: vec![item(
                1,
                "AU",
                "Australia",
                EntryType::Credit,
                1000,
                10000,
                "AUD",
            )],
            ..Group::default()
        };
        group.recompute_totals();
        let first = group.clone();
        group.recompute_totals();
        assert_eq!(group, first);
    }

    #[test]
    fn test_divisions_discovered_in_item_order() {
        let divisions = build_divisions(vec![
            item(1, "NZ", "New Zealand", EntryType::Credit, 150, 1000, "NZD"),
            item(2, "AU", "Australia", EntryType::Credit, 100, 1000, "AUD"),
            item(3, "NZ", "New Zealand", EntryType::Debit, 75, 500, "NZD"),
        ]);

        assert_eq!(divisions.len(), 2);
        assert_eq!(divisions[0].id, "NZ");
        assert_eq!(divisions[1].id, "AU");
        assert_eq!(divisions[0].outputs.items.len(), 1);
        assert_eq!(divisions[0].inputs.items.len(), 1);
    }
}
