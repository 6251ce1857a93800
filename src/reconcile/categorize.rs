use crate::categorize::propose_categories;
use crate::error::{InvalidOperation, Rejection};
use crate::models::EditRecord;
use crate::store;

use super::{require_selection, Session, TransactionEdit};

impl Session {
    /// Move a transaction's amount from its old category to a new one.
    ///
    /// Returns false when the transaction already had that category.
    pub(super) fn categorize(&mut self, id: &str, category: &str) -> Result<bool, Rejection> {
        let txn = self.transaction_or_reject(id)?;
        let new = store::canonical_category(category);
        if txn.category == new {
            return Ok(false);
        }

        self.unpost(&txn.category, txn.amount);
        self.post(&new, txn.amount);

        if let Some(stored) = store::get_mut(&mut self.aggregate.transactions, id) {
            store::set_category(stored, &new, self.now);
        }
        self.mark_changed(id);
        Ok(true)
    }

    /// Each id is categorized on its own; they only touch their own old and
    /// new accounts, so order does not matter.
    pub(super) fn bulk_categorize(&mut self, ids: &[String], category: &str) -> Result<(), Rejection> {
        require_selection(ids)?;
        for id in ids {
            if let Err(reason) = self.categorize(id, category) {
                self.skip(id, reason);
            }
        }
        Ok(())
    }

    pub(super) fn auto_categorize(&mut self) {
        let proposals = propose_categories(&self.aggregate.transactions, &self.aggregate.category_rules);
        for proposal in proposals {
            log::debug!(
                "rule {} suggests {} for {}",
                proposal.rule_id,
                proposal.category,
                proposal.transaction_id
            );
            if let Err(reason) = self.categorize(&proposal.transaction_id, &proposal.category) {
                self.skip(&proposal.transaction_id, reason);
            }
        }
    }

    /// Edit description, date or amount. A new amount is re-posted in full.
    pub(super) fn edit_transaction(&mut self, id: &str, edit: &TransactionEdit) -> Result<(), Rejection> {
        let before = self.transaction_or_reject(id)?;
        if edit.amount.is_some() && before.is_journal_entry {
            return Err(InvalidOperation::JournalEntryLeg.into());
        }

        let mut after = before.clone();
        let mut record = EditRecord::new(self.now);
        if let Some(description) = &edit.description {
            let description = description.trim();
            if description != after.description {
                record = record.change("description", &after.description, description);
                after.description = description.to_string();
            }
        }
        if let Some(date) = edit.date {
            if date != after.date {
                record = record.change("date", after.date, date);
                after.date = date;
            }
        }
        if let Some(amount) = edit.amount {
            if amount != after.amount {
                record = record.change("amount", after.amount, amount);
                after.amount = amount;
            }
        }
        if record.is_empty() {
            return Ok(());
        }

        if after.amount != before.amount {
            self.reverse_effect(&before);
            self.apply_effect(&after);
        }
        store::record_edit(&mut after, record);
        store::replace(&mut self.aggregate.transactions, after);
        self.mark_changed(id);
        Ok(())
    }
}
