mod chart;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    in_sign_flip_range, is_uncategorized, less_accumulated, Account, BankAccount, Transaction,
};

pub(crate) use chart::{
    add_account, bulk_change_type, delete_account, update_account, AccountPatch,
};

/// The amount that lands in `account_number`'s balance for a transaction amount.
///
/// Income/expense-range accounts (numbered 4000 and up) take the flipped sign;
/// everything else, including non-numeric numbers, takes the raw amount.
pub(crate) fn sign_normalized(account_number: &str, amount: Decimal) -> Decimal {
    if in_sign_flip_range(account_number) {
        -amount
    } else {
        amount
    }
}

/// Add `delta` to an account's running balance.
///
/// Returns false, changing nothing, when the account does not exist.
pub(crate) fn adjust_balance(accounts: &mut [Account], account_number: &str, delta: Decimal) -> bool {
    let number = account_number.trim();
    match accounts.iter_mut().find(|a| a.account_number == number) {
        Some(account) => {
            account.balance += delta;
            true
        }
        None => false,
    }
}

/// Add `delta` to a bank account's raw cash balance. False when it does not exist.
pub(crate) fn adjust_bank_balance(banks: &mut [BankAccount], bank_account_id: &str, delta: Decimal) -> bool {
    match banks.iter_mut().find(|b| b.id == bank_account_id) {
        Some(bank) => {
            bank.balance += delta;
            true
        }
        None => false,
    }
}

/// Point-in-time balance recomputed from the transactions themselves.
///
/// Folds every non-excluded transaction dated on or before `as_of` whose
/// category is `account_number`, using the same sign rule as the running
/// balance. The uncategorized sentinel has no balance.
pub(crate) fn balance_as_of(
    accounts: &[Account],
    account_number: &str,
    as_of: NaiveDate,
    transactions: &[Transaction],
) -> Decimal {
    let number = account_number.trim();
    if is_uncategorized(number) {
        return Decimal::ZERO;
    }
    let sum: Decimal = transactions
        .iter()
        .filter(|t| !t.excluded && t.date <= as_of && t.category.trim() == number)
        .map(|t| sign_normalized(number, t.amount))
        .sum();
    let is_less = Account::find(accounts, number).is_some_and(|a| a.is_less_accumulated);
    less_accumulated(sum, is_less)
}

/// Every account's running balance recomputed from scratch over all transactions.
///
/// Excluded transactions are counted, matching how the running balances treat them.
pub(crate) fn recompute_running(accounts: &[Account], transactions: &[Transaction]) -> Vec<(String, Decimal)> {
    accounts
        .iter()
        .filter(|a| !a.is_reserved())
        .map(|a| {
            let sum = transactions
                .iter()
                .filter(|t| t.category.trim() == a.account_number)
                .map(|t| sign_normalized(&a.account_number, t.amount))
                .sum();
            (a.account_number.clone(), sum)
        })
        .collect()
}
