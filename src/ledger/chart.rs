use chrono::{DateTime, Utc};

use crate::error::{InvalidOperation, Rejection};
use crate::models::{Account, AccountType, Transaction, UNCATEGORIZED};
use crate::store;

/// Field edits for an existing account. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AccountPatch {
    pub(crate) account_name: Option<String>,
    pub(crate) account_type: Option<AccountType>,
    pub(crate) is_less_accumulated: Option<bool>,
    pub(crate) is_active: Option<bool>,
}

pub(crate) fn add_account(accounts: &mut Vec<Account>, account: Account) -> Result<(), Rejection> {
    let number = account.account_number.trim().to_string();
    if number.is_empty() {
        return Err(InvalidOperation::BlankAccountNumber.into());
    }
    if number == UNCATEGORIZED {
        return Err(InvalidOperation::ReservedAccountNumber.into());
    }
    if Account::find(accounts, &number).is_some() {
        return Err(InvalidOperation::DuplicateAccountNumber(number).into());
    }
    accounts.push(Account {
        account_number: number,
        ..account
    });
    Ok(())
}

pub(crate) fn update_account(
    accounts: &mut [Account],
    account_number: &str,
    patch: &AccountPatch,
) -> Result<(), Rejection> {
    let number = account_number.trim();
    let account = accounts
        .iter_mut()
        .find(|a| a.account_number == number)
        .ok_or_else(|| Rejection::AccountNotFound(number.to_string()))?;

    if account.is_reserved() {
        if patch.is_active == Some(false) {
            return Err(InvalidOperation::DeactivateReservedAccount.into());
        }
        if patch.account_type.is_some_and(|t| t != account.account_type) {
            return Err(InvalidOperation::RetypeReservedAccount.into());
        }
    }

    if let Some(name) = &patch.account_name {
        account.account_name = name.trim().to_string();
    }
    if let Some(kind) = patch.account_type {
        account.account_type = kind;
    }
    if let Some(less) = patch.is_less_accumulated {
        account.is_less_accumulated = less;
    }
    if let Some(active) = patch.is_active {
        account.is_active = active;
    }
    Ok(())
}

/// Retype several accounts at once. The whole batch is refused if it names
/// the Uncategorized account; unknown numbers are returned and skipped.
pub(crate) fn bulk_change_type(
    accounts: &mut [Account],
    account_numbers: &[String],
    account_type: AccountType,
) -> Result<Vec<String>, Rejection> {
    if account_numbers.iter().any(|n| n.trim() == UNCATEGORIZED) {
        return Err(InvalidOperation::RetypeReservedAccount.into());
    }
    let mut missing = Vec::new();
    for number in account_numbers {
        match accounts.iter_mut().find(|a| a.account_number == number.trim()) {
            Some(account) => account.account_type = account_type,
            None => missing.push(number.trim().to_string()),
        }
    }
    Ok(missing)
}

/// Remove an account after moving its transactions to Uncategorized.
///
/// Returns the removed account so it can be kept as a recoverable item.
pub(crate) fn delete_account(
    accounts: &mut Vec<Account>,
    transactions: &mut [Transaction],
    account_number: &str,
    now: DateTime<Utc>,
) -> Result<Account, Rejection> {
    let number = account_number.trim();
    if number == UNCATEGORIZED {
        return Err(InvalidOperation::DeleteReservedAccount.into());
    }
    let index = accounts
        .iter()
        .position(|a| a.account_number == number)
        .ok_or_else(|| Rejection::AccountNotFound(number.to_string()))?;

    for txn in transactions.iter_mut().filter(|t| t.category.trim() == number) {
        store::set_category(txn, UNCATEGORIZED, now);
    }
    Ok(accounts.remove(index))
}
