use rust_decimal::Decimal;

use crate::error::{InvalidOperation, Rejection};
use crate::ledger;
use crate::models::{Account, EditRecord, NewTransaction, Removed, Transaction};
use crate::store;

use super::{new_id, require_selection, Session};

impl Session {
    /// Bring a new transaction into the books. Returns its id.
    ///
    /// This is the only way money enters the system: the category account
    /// gets the sign-normalized amount and the bank account the raw amount.
    pub(super) fn add_transaction(&mut self, new: NewTransaction) -> Result<String, Rejection> {
        let bank = new
            .bank_account_id
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        if new.source.requires_bank_account() && bank.is_none() {
            return Err(InvalidOperation::MissingBankAccount.into());
        }

        let mut txn = Transaction::new(
            new_id(),
            new.date,
            new.description.trim().to_string(),
            new.amount,
            new.source,
        );
        txn.category = store::canonical_category(&new.category);
        txn.bank_account_id = bank;

        self.apply_effect(&txn);
        let id = txn.id.clone();
        store::insert(&mut self.aggregate.transactions, txn);
        self.mark_changed(&id);
        Ok(id)
    }

    /// Add uploaded rows one by one, skipping any row identical to one
    /// already in the books for the same bank account.
    pub(super) fn import_transactions(&mut self, rows: Vec<NewTransaction>) {
        for (index, row) in rows.into_iter().enumerate() {
            let label = format!("row {}", index + 1);
            let already_there = self.aggregate.transactions.iter().any(|t| {
                t.date == row.date
                    && t.amount == row.amount
                    && t.description.trim() == row.description.trim()
                    && t.bank_account_id == row.bank_account_id
            });
            if already_there {
                self.skip(&label, InvalidOperation::DuplicateImport.into());
                continue;
            }
            if let Err(reason) = self.add_transaction(row) {
                self.skip(&label, reason);
            }
        }
    }

    /// Take a transaction out of the books, reversing everything it posted.
    ///
    /// Both legs of a journal entry always leave together. Deleting an offset
    /// leaves its original unreconciled.
    pub(super) fn delete_transaction(&mut self, id: &str) -> Result<(), Rejection> {
        let txn = self.transaction_or_reject(id)?;

        let mut ids = vec![txn.id.clone()];
        if let Some(entry) = txn.journal_entry_id.as_deref() {
            ids.extend(
                self.aggregate
                    .transactions
                    .iter()
                    .filter(|t| t.id != txn.id && t.journal_entry_id.as_deref() == Some(entry))
                    .map(|t| t.id.clone()),
            );
        }

        for id in ids {
            if let Some(removed) = store::remove(&mut self.aggregate.transactions, &id) {
                self.reverse_effect(&removed);
                if !removed.is_journal_entry {
                    if let Some(original) = removed.related_transaction_id.as_deref() {
                        self.detach_offset(original, &removed.id);
                    }
                }
                self.removed.push(Removed::Transaction(removed));
            }
        }
        Ok(())
    }

    /// Hide or unhide transactions. Balances are untouched: excluded
    /// transactions are hidden from views, not removed from the books.
    pub(super) fn set_excluded(&mut self, ids: &[String], excluded: bool) -> Result<(), Rejection> {
        require_selection(ids)?;
        for id in ids {
            let now = self.now;
            let Some(txn) = store::get_mut(&mut self.aggregate.transactions, id) else {
                self.skip(id, Rejection::TransactionNotFound(id.clone()));
                continue;
            };
            if txn.excluded == excluded {
                continue;
            }
            let record = EditRecord::new(now).change("excluded", txn.excluded, excluded);
            txn.excluded = excluded;
            store::record_edit(txn, record);
            self.mark_changed(id);
        }
        Ok(())
    }

    /// Put removed items back exactly as they were. Transactions are
    /// re-posted; accounts come back empty since their transactions were
    /// moved to Uncategorized when they left.
    pub(super) fn restore_deleted(&mut self, items: Vec<Removed>) -> Result<(), Rejection> {
        if items.is_empty() {
            return Err(InvalidOperation::EmptySelection.into());
        }
        for item in items {
            match item {
                Removed::Transaction(txn) => {
                    if store::contains(&self.aggregate.transactions, &txn.id) {
                        return Err(InvalidOperation::AlreadyActive(txn.id).into());
                    }
                    if !txn.is_journal_entry && txn.related_transaction_id.is_some() {
                        self.reattach_offset(&txn)?;
                    }
                    self.apply_effect(&txn);
                    let id = txn.id.clone();
                    let dangling = txn
                        .offset_transaction_id
                        .as_deref()
                        .is_some_and(|o| !store::contains(&self.aggregate.transactions, o));
                    store::insert(&mut self.aggregate.transactions, txn);
                    if dangling {
                        self.clear_offset(&id);
                    }
                    self.mark_changed(&id);
                }
                Removed::Account(account) => {
                    let number = account.account_number.clone();
                    ledger::add_account(
                        &mut self.aggregate.accounts,
                        Account {
                            balance: Decimal::ZERO,
                            ..account
                        },
                    )?;
                    self.mark_changed(&number);
                }
                Removed::CategoryRule(rule) => {
                    if self.aggregate.category_rules.iter().any(|r| r.id == rule.id) {
                        return Err(InvalidOperation::AlreadyActive(rule.id).into());
                    }
                    let id = rule.id.clone();
                    self.aggregate.category_rules.push(rule);
                    self.mark_changed(&id);
                }
            }
        }
        Ok(())
    }
}
