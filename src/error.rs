use thiserror::Error;

/// Why an intent, or one item of a bulk intent, was turned down.
///
/// Messages are written for the bookkeeper reading them, not for developers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Rejection {
    #[error("selected transaction not found")]
    TransactionNotFound(String),

    #[error("selected account not found")]
    AccountNotFound(String),

    #[error("selected bank account not found")]
    BankAccountNotFound(String),

    #[error("category rule not found")]
    RuleNotFound(String),

    #[error("deleted item not found; it may already have been restored")]
    RecoverableNotFound(String),

    #[error("{0}")]
    Invalid(#[from] InvalidOperation),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum InvalidOperation {
    #[error("the Uncategorized account cannot be deleted")]
    DeleteReservedAccount,

    #[error("the Uncategorized account cannot be deactivated")]
    DeactivateReservedAccount,

    #[error("the Uncategorized account's type cannot be changed")]
    RetypeReservedAccount,

    #[error("account number 00000 is reserved for Uncategorized")]
    ReservedAccountNumber,

    #[error("account number {0} is already in use")]
    DuplicateAccountNumber(String),

    #[error("account number is required")]
    BlankAccountNumber,

    #[error("bank account {0} already exists")]
    DuplicateBankAccount(String),

    #[error("select a bank account for this transaction")]
    MissingBankAccount,

    #[error("select an offset account")]
    MissingOffsetCategory,

    #[error("a journal entry needs at least one debit and credit line")]
    EmptyJournalEntry,

    #[error("line {line}: debit and credit totals must match")]
    UnbalancedJournalLine { line: usize },

    #[error("line {line}: amounts must be greater than zero")]
    NonPositiveJournalLine { line: usize },

    #[error("line {line}: select both a debit and a credit account")]
    MissingJournalCategory { line: usize },

    #[error("this transaction is part of a journal entry; delete the journal entry instead")]
    JournalEntryLeg,

    #[error("this row was already imported")]
    DuplicateImport,

    #[error("select a category for this rule")]
    MissingRuleCategory,

    #[error("transaction {0} is already in the books")]
    AlreadyActive(String),

    #[error("this transaction has no reconciliation to undo")]
    NotReconciled,

    #[error("the transaction this offset reconciled is gone or has a newer offset")]
    OffsetOriginalUnavailable,

    #[error("a rule needs at least one keyword")]
    EmptyRule,

    #[error("nothing selected")]
    EmptySelection,
}

/// Failures of the persistence boundary.
#[derive(Error, Debug)]
pub(crate) enum StoreError {
    #[error("company data changed while saving (expected version {expected}, found {found})")]
    ConcurrencyConflict { expected: u64, found: u64 },

    #[error("company {0} not found")]
    CompanyNotFound(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("stored data is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}
