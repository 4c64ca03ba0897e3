use std::cmp::Ordering;

use convey_types::api::{LedgerPage, LedgerSort};
use convey_types::models::LedgerEntry;

use crate::error::Result;
use crate::store::LedgerSource;

/// Per-alias balances and sorted ledger views over externally maintained
/// counters.
pub struct LedgerAggregator<'l, L: LedgerSource + ?Sized> {
    source: &'l L,
}

impl<'l, L: LedgerSource + ?Sized> LedgerAggregator<'l, L> {
    pub fn new(source: &'l L) -> Self {
        Self { source }
    }

    /// Balance of one alias. Aliases without counters hold nothing.
    pub fn balance(&self, alias: &str) -> Result<i64> {
        Ok(self
            .source
            .ledger_counters()?
            .get(alias)
            .map(|counters| counters.balance())
            .unwrap_or(0))
    }

    /// One entry per alias the ledger knows, ordered by `sort`, descending.
    pub fn entries(&self, sort: LedgerSort) -> Result<Vec<LedgerEntry>> {
        let mut entries: Vec<LedgerEntry> = self
            .source
            .ledger_counters()?
            .iter()
            .map(|(alias, counters)| LedgerEntry::new(alias.as_str(), counters))
            .collect();
        sort_entries(&mut entries, sort);
        Ok(entries)
    }

    pub fn page(&self, sort: LedgerSort) -> Result<LedgerPage> {
        Ok(LedgerPage {
            entries: self.entries(sort)?,
            sort,
        })
    }
}

/// Order entries by `sort`, largest first. Aliases compare in reverse
/// lexicographic order like every other column; ties on a numeric column
/// fall back to alias ascending.
pub fn sort_entries(entries: &mut [LedgerEntry], sort: LedgerSort) {
    entries.sort_by(|a, b| compare(a, b, sort));
}

fn compare(a: &LedgerEntry, b: &LedgerEntry, sort: LedgerSort) -> Ordering {
    let primary = match sort {
        LedgerSort::Alias => return b.alias.cmp(&a.alias),
        LedgerSort::Minted => b.minted.cmp(&a.minted),
        LedgerSort::Burned => b.burned.cmp(&a.burned),
        LedgerSort::Bought => b.bought.cmp(&a.bought),
        LedgerSort::Sold => b.sold.cmp(&a.sold),
        LedgerSort::Earned => b.earned.cmp(&a.earned),
        LedgerSort::Spent => b.spent.cmp(&a.spent),
        LedgerSort::Balance => b.balance.cmp(&a.balance),
    };
    primary.then_with(|| a.alias.cmp(&b.alias))
}
