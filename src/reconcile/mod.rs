//! The Balance Reconciler.
//!
//! Every mutation of a company's books goes through [`apply`]: it takes the
//! current aggregate and an [`Intent`], works on a private copy, and hands
//! back the new aggregate together with what changed. All balance arithmetic
//! happens in the posting helpers on [`Session`], so every intent moves money
//! under the same sign rule.

mod admin;
mod categorize;
mod journal;
mod lifecycle;
mod offset;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::error::{InvalidOperation, Rejection};
use crate::ledger::{self, AccountPatch};
use crate::models::{
    is_uncategorized, Account, AccountType, BankAccount, CompanyAggregate, EntryType,
    NewTransaction, Removed, Transaction,
};

pub(crate) use journal::{JournalLine, JournalPair};

/// Field edits for a transaction. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TransactionEdit {
    pub(crate) description: Option<String>,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) amount: Option<Decimal>,
}

/// The offsetting entry to attach to a transaction when reconciling it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OffsetSpec {
    pub(crate) category: String,
    pub(crate) entry_type: EntryType,
    pub(crate) description: String,
    /// Defaults to the reconciled transaction's own amount.
    pub(crate) amount: Option<Decimal>,
}

impl OffsetSpec {
    pub(crate) fn new(category: &str, entry_type: EntryType, description: &str) -> Self {
        Self {
            category: category.trim().to_string(),
            entry_type,
            description: description.trim().to_string(),
            amount: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Intent {
    Categorize {
        transaction_id: String,
        category: String,
    },
    BulkCategorize {
        transaction_ids: Vec<String>,
        category: String,
    },
    /// Apply the first matching category rule to every uncategorized transaction.
    AutoCategorize,
    EditTransaction {
        transaction_id: String,
        edit: TransactionEdit,
    },
    AddTransaction(NewTransaction),
    /// Add many uploaded rows, skipping rows already in the books.
    ImportTransactions(Vec<NewTransaction>),
    DeleteTransaction {
        transaction_id: String,
    },
    BulkExclude {
        transaction_ids: Vec<String>,
    },
    BulkInclude {
        transaction_ids: Vec<String>,
    },
    /// Put previously removed items back. The caller takes them out of the
    /// recoverable store.
    RestoreDeleted {
        items: Vec<Removed>,
    },
    BulkReconcile {
        transaction_ids: Vec<String>,
        offset: OffsetSpec,
    },
    UndoReconciliation {
        transaction_ids: Vec<String>,
    },
    AddOrUpdateOffset {
        transaction_id: String,
        offset: OffsetSpec,
    },
    JournalEntry {
        date: NaiveDate,
        description: String,
        pairs: Vec<JournalPair>,
    },
    AddAccount(Account),
    UpdateAccount {
        account_number: String,
        patch: AccountPatch,
    },
    BulkChangeAccountType {
        account_numbers: Vec<String>,
        account_type: AccountType,
    },
    DeleteAccount {
        account_number: String,
    },
    AddBankAccount(BankAccount),
    AddRule {
        category: String,
        patterns: Vec<String>,
    },
    UpdateRule {
        rule_id: String,
        category: Option<String>,
        patterns: Option<Vec<String>>,
    },
    DeleteRule {
        rule_id: String,
    },
}

impl Intent {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Categorize { .. } => "categorize",
            Self::BulkCategorize { .. } => "bulk-categorize",
            Self::AutoCategorize => "auto-categorize",
            Self::EditTransaction { .. } => "edit-transaction",
            Self::AddTransaction(_) => "add-transaction",
            Self::ImportTransactions(_) => "import-transactions",
            Self::DeleteTransaction { .. } => "delete-transaction",
            Self::BulkExclude { .. } => "bulk-exclude",
            Self::BulkInclude { .. } => "bulk-include",
            Self::RestoreDeleted { .. } => "restore-deleted",
            Self::BulkReconcile { .. } => "bulk-reconcile",
            Self::UndoReconciliation { .. } => "undo-reconciliation",
            Self::AddOrUpdateOffset { .. } => "add-or-update-offset",
            Self::JournalEntry { .. } => "journal-entry",
            Self::AddAccount(_) => "add-account",
            Self::UpdateAccount { .. } => "update-account",
            Self::BulkChangeAccountType { .. } => "bulk-change-account-type",
            Self::DeleteAccount { .. } => "delete-account",
            Self::AddBankAccount(_) => "add-bank-account",
            Self::AddRule { .. } => "add-rule",
            Self::UpdateRule { .. } => "update-rule",
            Self::DeleteRule { .. } => "delete-rule",
        }
    }
}

/// A balance posting that could not land because its target is gone.
///
/// The transaction side of the intent still happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Warning {
    MissingAccount(String),
    MissingBankAccount(String),
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAccount(n) => write!(f, "account {n} not found; its balance was not updated"),
            Self::MissingBankAccount(id) => {
                write!(f, "bank account {id} not found; its balance was not updated")
            }
        }
    }
}

/// One item of a bulk intent that was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Skipped {
    pub(crate) id: String,
    pub(crate) reason: Rejection,
}

#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub(crate) aggregate: CompanyAggregate,
    /// Ids of transactions, accounts, bank accounts and rules created or updated.
    pub(crate) changed: Vec<String>,
    pub(crate) skipped: Vec<Skipped>,
    pub(crate) warnings: Vec<Warning>,
    /// Items taken out of the books, to be kept as recoverable.
    pub(crate) removed: Vec<Removed>,
}

/// Run one intent against a snapshot.
///
/// On rejection nothing is returned, so a partly applied intent can never be
/// observed.
pub(crate) fn apply(
    aggregate: &CompanyAggregate,
    intent: Intent,
    now: DateTime<Utc>,
) -> Result<Outcome, Rejection> {
    let name = intent.name();
    let mut session = Session::new(aggregate.clone(), now);
    session.run(intent)?;
    let outcome = session.finish();
    log::debug!(
        "{name}: {} changed, {} skipped, {} removed",
        outcome.changed.len(),
        outcome.skipped.len(),
        outcome.removed.len()
    );
    Ok(outcome)
}

/// Working state for one intent.
struct Session {
    aggregate: CompanyAggregate,
    now: DateTime<Utc>,
    changed: Vec<String>,
    skipped: Vec<Skipped>,
    warnings: Vec<Warning>,
    removed: Vec<Removed>,
}

impl Session {
    fn new(aggregate: CompanyAggregate, now: DateTime<Utc>) -> Self {
        Self {
            aggregate,
            now,
            changed: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            removed: Vec::new(),
        }
    }

    fn run(&mut self, intent: Intent) -> Result<(), Rejection> {
        match intent {
            Intent::Categorize {
                transaction_id,
                category,
            } => self.categorize(&transaction_id, &category).map(|_| ()),
            Intent::BulkCategorize {
                transaction_ids,
                category,
            } => self.bulk_categorize(&transaction_ids, &category),
            Intent::AutoCategorize => {
                self.auto_categorize();
                Ok(())
            }
            Intent::EditTransaction {
                transaction_id,
                edit,
            } => self.edit_transaction(&transaction_id, &edit),
            Intent::AddTransaction(new) => self.add_transaction(new).map(|_| ()),
            Intent::ImportTransactions(rows) => {
                self.import_transactions(rows);
                Ok(())
            }
            Intent::DeleteTransaction { transaction_id } => self.delete_transaction(&transaction_id),
            Intent::BulkExclude { transaction_ids } => self.set_excluded(&transaction_ids, true),
            Intent::BulkInclude { transaction_ids } => self.set_excluded(&transaction_ids, false),
            Intent::RestoreDeleted { items } => self.restore_deleted(items),
            Intent::BulkReconcile {
                transaction_ids,
                offset,
            } => self.bulk_reconcile(&transaction_ids, &offset),
            Intent::UndoReconciliation { transaction_ids } => {
                self.undo_reconciliation(&transaction_ids)
            }
            Intent::AddOrUpdateOffset {
                transaction_id,
                offset,
            } => self.add_or_update_offset(&transaction_id, &offset),
            Intent::JournalEntry {
                date,
                description,
                pairs,
            } => self.journal_entry(date, &description, &pairs),
            Intent::AddAccount(account) => self.add_account(account),
            Intent::UpdateAccount {
                account_number,
                patch,
            } => self.update_account(&account_number, &patch),
            Intent::BulkChangeAccountType {
                account_numbers,
                account_type,
            } => self.bulk_change_account_type(&account_numbers, account_type),
            Intent::DeleteAccount { account_number } => self.delete_account(&account_number),
            Intent::AddBankAccount(bank) => self.add_bank_account(bank),
            Intent::AddRule { category, patterns } => self.add_rule(&category, patterns),
            Intent::UpdateRule {
                rule_id,
                category,
                patterns,
            } => self.update_rule(&rule_id, category, patterns),
            Intent::DeleteRule { rule_id } => self.delete_rule(&rule_id),
        }
    }

    fn finish(self) -> Outcome {
        Outcome {
            aggregate: self.aggregate,
            changed: self.changed,
            skipped: self.skipped,
            warnings: self.warnings,
            removed: self.removed,
        }
    }

    // ── Bookkeeping of the outcome ───────────────────────────

    fn mark_changed(&mut self, id: &str) {
        if !self.changed.iter().any(|c| c == id) {
            self.changed.push(id.to_string());
        }
    }

    fn skip(&mut self, id: &str, reason: Rejection) {
        log::debug!("skipping {id}: {reason}");
        self.skipped.push(Skipped {
            id: id.to_string(),
            reason,
        });
    }

    fn warn(&mut self, warning: Warning) {
        if !self.warnings.contains(&warning) {
            log::warn!("{warning}");
            self.warnings.push(warning);
        }
    }

    // ── Postings ─────────────────────────────────────────────

    /// Post a transaction amount into a category account under the sign rule.
    /// The uncategorized sentinel never carries a balance.
    fn post(&mut self, category: &str, amount: Decimal) {
        if is_uncategorized(category) {
            return;
        }
        let delta = ledger::sign_normalized(category, amount);
        if !ledger::adjust_balance(&mut self.aggregate.accounts, category, delta) {
            self.warn(Warning::MissingAccount(category.trim().to_string()));
        }
    }

    fn unpost(&mut self, category: &str, amount: Decimal) {
        self.post(category, -amount);
    }

    /// Bank balances take the raw cash amount, never the category sign rule.
    fn post_bank(&mut self, bank_account_id: Option<&str>, amount: Decimal) {
        let Some(id) = bank_account_id.filter(|id| !id.trim().is_empty()) else {
            return;
        };
        if !ledger::adjust_bank_balance(&mut self.aggregate.bank_accounts, id, amount) {
            self.warn(Warning::MissingBankAccount(id.to_string()));
        }
    }

    /// Everything a transaction contributes to balances when it enters the books.
    fn apply_effect(&mut self, txn: &Transaction) {
        self.post(&txn.category, txn.amount);
        self.post_bank(txn.bank_account_id.as_deref(), txn.amount);
    }

    fn reverse_effect(&mut self, txn: &Transaction) {
        self.unpost(&txn.category, txn.amount);
        self.post_bank(txn.bank_account_id.as_deref(), -txn.amount);
    }

    fn transaction_or_reject(&self, id: &str) -> Result<Transaction, Rejection> {
        self.aggregate
            .transaction(id)
            .cloned()
            .ok_or_else(|| Rejection::TransactionNotFound(id.to_string()))
    }
}

fn require_selection(ids: &[String]) -> Result<(), Rejection> {
    if ids.is_empty() {
        return Err(InvalidOperation::EmptySelection.into());
    }
    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
