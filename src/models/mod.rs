mod account;
mod aggregate;
mod bank_account;
mod category_rule;
mod transaction;

pub(crate) use account::{
    in_sign_flip_range, is_uncategorized, less_accumulated, Account, AccountCategory,
    AccountType, UNCATEGORIZED,
};
pub(crate) use aggregate::{
    AggregateUpdate, CompanyAggregate, ItemType, RecoverableItem, Removed, Versioned,
};
pub(crate) use bank_account::BankAccount;
pub(crate) use category_rule::CategoryRule;
pub(crate) use transaction::{
    EditRecord, EntryType, FieldChange, NewTransaction, Source, Transaction,
};

#[cfg(test)]
mod tests;
