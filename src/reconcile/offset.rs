use crate::error::{InvalidOperation, Rejection};
use crate::models::{is_uncategorized, EditRecord, Source, Transaction};
use crate::store;

use super::{new_id, require_selection, OffsetSpec, Session};

fn show<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn validate(spec: &OffsetSpec) -> Result<(), Rejection> {
    if is_uncategorized(&spec.category) {
        return Err(InvalidOperation::MissingOffsetCategory.into());
    }
    Ok(())
}

impl Session {
    /// Attach an offsetting entry to each selected transaction.
    pub(super) fn bulk_reconcile(&mut self, ids: &[String], spec: &OffsetSpec) -> Result<(), Rejection> {
        require_selection(ids)?;
        validate(spec)?;
        for id in ids {
            if let Err(reason) = self.set_offset(id, spec) {
                self.skip(id, reason);
            }
        }
        Ok(())
    }

    pub(super) fn undo_reconciliation(&mut self, ids: &[String]) -> Result<(), Rejection> {
        require_selection(ids)?;
        for id in ids {
            let reason = match self.aggregate.transaction(id) {
                None => Some(Rejection::TransactionNotFound(id.clone())),
                Some(t) if t.is_journal_entry => Some(InvalidOperation::JournalEntryLeg.into()),
                Some(t) if !t.has_offset() => Some(InvalidOperation::NotReconciled.into()),
                Some(_) => None,
            };
            match reason {
                Some(reason) => self.skip(id, reason),
                None => self.clear_offset(id),
            }
        }
        Ok(())
    }

    /// Replace a transaction's offset, reversing any earlier one first so the
    /// old offset is never counted twice.
    pub(super) fn add_or_update_offset(&mut self, id: &str, spec: &OffsetSpec) -> Result<(), Rejection> {
        validate(spec)?;
        self.set_offset(id, spec)
    }

    fn set_offset(&mut self, id: &str, spec: &OffsetSpec) -> Result<(), Rejection> {
        let txn = self.transaction_or_reject(id)?;
        if txn.is_journal_entry {
            return Err(InvalidOperation::JournalEntryLeg.into());
        }
        if txn.has_offset() {
            self.clear_offset(id);
        }
        let txn = self.transaction_or_reject(id)?;

        let amount = spec.entry_type.signed(spec.amount.unwrap_or(txn.amount));
        let description = if spec.description.is_empty() {
            txn.description.clone()
        } else {
            spec.description.clone()
        };
        let category = store::canonical_category(&spec.category);

        let mut offset = Transaction::new(new_id(), txn.date, description.clone(), amount, Source::Reconciliation);
        offset.category = category.clone();
        offset.entry_type = Some(spec.entry_type);
        offset.related_transaction_id = Some(txn.id.clone());
        offset.is_reconciled = true;

        self.post(&category, amount);
        let offset_id = offset.id.clone();
        store::insert(&mut self.aggregate.transactions, offset);

        let now = self.now;
        if let Some(stored) = store::get_mut(&mut self.aggregate.transactions, id) {
            let record = EditRecord::new(now)
                .change("isReconciled", stored.is_reconciled, true)
                .change("offsetCategory", show(stored.offset_category.as_ref()), &category)
                .change("offsetAmount", show(stored.offset_amount), amount)
                .change("offsetDescription", show(stored.offset_description.as_ref()), &description)
                .change("offsetTransactionId", show(stored.offset_transaction_id.as_ref()), &offset_id);
            stored.is_reconciled = true;
            stored.offset_category = Some(category);
            stored.offset_amount = Some(amount);
            stored.offset_description = Some(description);
            stored.offset_transaction_id = Some(offset_id.clone());
            store::record_edit(stored, record);
        }
        self.mark_changed(id);
        self.mark_changed(&offset_id);
        Ok(())
    }

    /// Strip the reconciliation fields of `original` when they still point
    /// at `offset_id`, an offset that has just left the books.
    pub(super) fn detach_offset(&mut self, original: &str, offset_id: &str) {
        let points_here = self
            .aggregate
            .transaction(original)
            .is_some_and(|t| t.offset_transaction_id.as_deref() == Some(offset_id));
        if points_here {
            self.clear_offset(original);
        }
    }

    /// Link a restored offset back to its original, which must be in the
    /// books and not reconciled to a different offset.
    pub(super) fn reattach_offset(&mut self, offset: &Transaction) -> Result<(), Rejection> {
        let now = self.now;
        let original = offset
            .related_transaction_id
            .as_deref()
            .and_then(|id| store::get_mut(&mut self.aggregate.transactions, id))
            .filter(|t| {
                !t.is_journal_entry && t.offset_transaction_id.as_deref().map_or(true, |o| o == offset.id)
            })
            .ok_or(InvalidOperation::OffsetOriginalUnavailable)?;
        if original.has_offset() {
            return Ok(());
        }

        let record = EditRecord::new(now)
            .change("isReconciled", original.is_reconciled, true)
            .change("offsetCategory", "", &offset.category)
            .change("offsetAmount", "", offset.amount)
            .change("offsetDescription", "", &offset.description)
            .change("offsetTransactionId", "", &offset.id);
        original.is_reconciled = true;
        original.offset_category = Some(offset.category.clone());
        original.offset_amount = Some(offset.amount);
        original.offset_description = Some(offset.description.clone());
        original.offset_transaction_id = Some(offset.id.clone());
        store::record_edit(original, record);

        let id = original.id.clone();
        self.mark_changed(&id);
        Ok(())
    }

    /// Remove a transaction's offset entry, reverse what it posted, and strip
    /// the reconciliation fields.
    ///
    /// An offset that is already out of the books had its balance reversed
    /// when it left, so only the fields are stripped.
    pub(super) fn clear_offset(&mut self, id: &str) {
        let Some(offset_id) = self
            .aggregate
            .transaction(id)
            .and_then(|t| t.offset_transaction_id.clone())
        else {
            return;
        };
        if let Some(offset) = store::remove(&mut self.aggregate.transactions, &offset_id) {
            self.unpost(&offset.category, offset.amount);
        }

        let now = self.now;
        if let Some(stored) = store::get_mut(&mut self.aggregate.transactions, id) {
            let record = EditRecord::new(now)
                .change("isReconciled", stored.is_reconciled, false)
                .change("offsetCategory", show(stored.offset_category.take()), "")
                .change("offsetAmount", show(stored.offset_amount.take()), "")
                .change("offsetDescription", show(stored.offset_description.take()), "")
                .change("offsetTransactionId", show(stored.offset_transaction_id.take()), "");
            stored.is_reconciled = false;
            store::record_edit(stored, record);
        }
        self.mark_changed(id);
    }
}
