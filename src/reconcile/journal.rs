use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{InvalidOperation, Rejection};
use crate::models::{is_uncategorized, EntryType, Source, Transaction};
use crate::store;

use super::{new_id, Session};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JournalLine {
    pub(crate) category: String,
    pub(crate) amount: Decimal,
}

impl JournalLine {
    pub(crate) fn new(category: &str, amount: Decimal) -> Self {
        Self {
            category: category.trim().to_string(),
            amount,
        }
    }
}

/// One debit and one credit of the same amount.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JournalPair {
    pub(crate) debit: JournalLine,
    pub(crate) credit: JournalLine,
}

impl JournalPair {
    pub(crate) fn new(debit_category: &str, credit_category: &str, amount: Decimal) -> Self {
        Self {
            debit: JournalLine::new(debit_category, amount),
            credit: JournalLine::new(credit_category, amount),
        }
    }
}

/// Check every line before anything is written. Lines are numbered from 1.
fn validate(pairs: &[JournalPair]) -> Result<(), Rejection> {
    if pairs.is_empty() {
        return Err(InvalidOperation::EmptyJournalEntry.into());
    }
    for (index, pair) in pairs.iter().enumerate() {
        let line = index + 1;
        if is_uncategorized(&pair.debit.category) || is_uncategorized(&pair.credit.category) {
            return Err(InvalidOperation::MissingJournalCategory { line }.into());
        }
        if pair.debit.amount <= Decimal::ZERO || pair.credit.amount <= Decimal::ZERO {
            return Err(InvalidOperation::NonPositiveJournalLine { line }.into());
        }
        if pair.debit.amount != pair.credit.amount {
            return Err(InvalidOperation::UnbalancedJournalLine { line }.into());
        }
    }
    Ok(())
}

fn leg(
    date: NaiveDate,
    description: &str,
    entry_id: &str,
    entry_type: EntryType,
    own: &JournalLine,
    other: &JournalLine,
) -> Transaction {
    let amount = entry_type.signed(own.amount);
    let mut txn = Transaction::new(
        new_id(),
        date,
        description.trim().to_string(),
        amount,
        Source::Reconciliation,
    );
    txn.category = store::canonical_category(&own.category);
    txn.is_reconciled = true;
    txn.is_journal_entry = true;
    txn.journal_entry_id = Some(entry_id.to_string());
    txn.entry_type = Some(entry_type);
    txn.offset_category = Some(store::canonical_category(&other.category));
    txn.offset_amount = Some(-amount);
    txn.offset_description = Some(description.trim().to_string());
    txn
}

impl Session {
    /// Record manual debit/credit pairs. Each pair becomes two linked
    /// transactions sharing a journal entry id; either every pair lands or
    /// none does.
    pub(super) fn journal_entry(
        &mut self,
        date: NaiveDate,
        description: &str,
        pairs: &[JournalPair],
    ) -> Result<(), Rejection> {
        validate(pairs)?;

        for pair in pairs {
            let entry_id = new_id();
            let mut debit = leg(date, description, &entry_id, EntryType::Debit, &pair.debit, &pair.credit);
            let mut credit = leg(date, description, &entry_id, EntryType::Credit, &pair.credit, &pair.debit);
            debit.related_transaction_id = Some(credit.id.clone());
            credit.related_transaction_id = Some(debit.id.clone());

            for txn in [debit, credit] {
                self.post(&txn.category, txn.amount);
                self.mark_changed(&txn.id);
                store::insert(&mut self.aggregate.transactions, txn);
            }
        }
        Ok(())
    }
}
