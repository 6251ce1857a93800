use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{is_uncategorized, EditRecord, Transaction};

/// Which category state a filter accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum CategoryState {
    #[default]
    Any,
    Uncategorized,
    Categorized,
    Exactly(String),
}

/// Predicate over transactions. Every `None` field accepts anything.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionFilter {
    pub(crate) from: Option<NaiveDate>,
    pub(crate) to: Option<NaiveDate>,
    pub(crate) bank_account_id: Option<String>,
    pub(crate) category: CategoryState,
    pub(crate) excluded: Option<bool>,
    pub(crate) reconciled: Option<bool>,
    /// `YYYY-MM`
    pub(crate) month: Option<String>,
}

impl TransactionFilter {
    pub(crate) fn active() -> Self {
        Self {
            excluded: Some(false),
            ..Self::default()
        }
    }

    pub(crate) fn matches(&self, txn: &Transaction) -> bool {
        if self.from.is_some_and(|from| txn.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| txn.date > to) {
            return false;
        }
        if let Some(bank) = &self.bank_account_id {
            if txn.bank_account_id.as_deref() != Some(bank.as_str()) {
                return false;
            }
        }
        let category_ok = match &self.category {
            CategoryState::Any => true,
            CategoryState::Uncategorized => !txn.is_categorized(),
            CategoryState::Categorized => txn.is_categorized(),
            CategoryState::Exactly(c) => txn.category.trim() == c.trim(),
        };
        if !category_ok {
            return false;
        }
        if self.excluded.is_some_and(|e| txn.excluded != e) {
            return false;
        }
        if self.reconciled.is_some_and(|r| txn.is_reconciled != r) {
            return false;
        }
        if let Some(month) = &self.month {
            if !txn.month().starts_with(month.as_str()) {
                return false;
            }
        }
        true
    }
}

pub(crate) fn get<'a>(transactions: &'a [Transaction], id: &str) -> Option<&'a Transaction> {
    transactions.iter().find(|t| t.id == id)
}

pub(crate) fn get_mut<'a>(transactions: &'a mut [Transaction], id: &str) -> Option<&'a mut Transaction> {
    transactions.iter_mut().find(|t| t.id == id)
}

pub(crate) fn contains(transactions: &[Transaction], id: &str) -> bool {
    transactions.iter().any(|t| t.id == id)
}

pub(crate) fn insert(transactions: &mut Vec<Transaction>, txn: Transaction) {
    transactions.push(txn);
}

/// Replace the transaction with the same id. Returns the previous value.
pub(crate) fn replace(transactions: &mut [Transaction], txn: Transaction) -> Option<Transaction> {
    let slot = transactions.iter_mut().find(|t| t.id == txn.id)?;
    Some(std::mem::replace(slot, txn))
}

pub(crate) fn remove(transactions: &mut Vec<Transaction>, id: &str) -> Option<Transaction> {
    let index = transactions.iter().position(|t| t.id == id)?;
    Some(transactions.remove(index))
}

pub(crate) fn filter<'a>(
    transactions: &'a [Transaction],
    filter: &'a TransactionFilter,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    transactions.iter().filter(move |t| filter.matches(t))
}

/// Append an edit record, skipping records that change nothing.
pub(crate) fn record_edit(txn: &mut Transaction, record: EditRecord) {
    if !record.is_empty() {
        txn.edit_history.push(record);
    }
}

/// Set the category and log the change. Returns false when nothing changed.
///
/// Blank categories are stored as the uncategorized sentinel.
pub(crate) fn set_category(txn: &mut Transaction, category: &str, now: DateTime<Utc>) -> bool {
    let new = canonical_category(category);
    if txn.category == new {
        return false;
    }
    let record = EditRecord::new(now).change("category", &txn.category, &new);
    txn.category = new;
    record_edit(txn, record);
    true
}

pub(crate) fn canonical_category(category: &str) -> String {
    if is_uncategorized(category) {
        crate::models::UNCATEGORIZED.to_string()
    } else {
        category.trim().to_string()
    }
}
