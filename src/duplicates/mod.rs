use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::Transaction;

/// Transactions that look like the same charge entered more than once.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DuplicateGroup {
    /// `YYYY-MM`
    pub(crate) month: String,
    pub(crate) amount: Decimal,
    /// Case-folded, trimmed description shared by the group.
    pub(crate) description: String,
    pub(crate) transaction_ids: Vec<String>,
}

impl DuplicateGroup {
    pub(crate) fn len(&self) -> usize {
        self.transaction_ids.len()
    }
}

fn duplicate_key(description: &str) -> String {
    description.trim().to_lowercase()
}

/// Group visible transactions by month, then by amount and description.
///
/// Only groups with more than one member are returned, ordered by month and
/// then by first appearance within the month. Nothing is deleted here.
pub(crate) fn find_duplicates(transactions: &[Transaction]) -> Vec<DuplicateGroup> {
    let mut by_month: BTreeMap<String, Vec<DuplicateGroup>> = BTreeMap::new();

    for txn in transactions.iter().filter(|t| !t.excluded) {
        let description = duplicate_key(&txn.description);
        let groups = by_month.entry(txn.month()).or_default();
        // Decimal equality ignores scale, so -45 and -45.00 land together.
        match groups
            .iter_mut()
            .find(|g| g.amount == txn.amount && g.description == description)
        {
            Some(group) => group.transaction_ids.push(txn.id.clone()),
            None => groups.push(DuplicateGroup {
                month: txn.month(),
                amount: txn.amount,
                description,
                transaction_ids: vec![txn.id.clone()],
            }),
        }
    }

    by_month
        .into_values()
        .flatten()
        .filter(|g| g.len() > 1)
        .collect()
}
