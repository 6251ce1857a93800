#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

// ── Transaction ───────────────────────────────────────────────

fn make_txn(amount: Decimal) -> Transaction {
    Transaction::new(
        "t1".into(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        "Test".into(),
        amount,
        Source::Manual,
    )
}

#[test]
fn test_new_transaction_is_uncategorized() {
    let txn = make_txn(dec!(1));
    assert_eq!(txn.category, UNCATEGORIZED);
    assert!(!txn.is_categorized());
    assert!(!txn.has_offset());
    assert_eq!(txn.month(), "2024-01");
}

#[test]
fn test_transaction_json_defaults() {
    // Older documents may lack every optional field.
    let json = r#"{"id":"a","date":"2024-03-02","description":"x","amount":"12.50","source":"upload"}"#;
    let txn: Transaction = serde_json::from_str(json).unwrap();
    assert_eq!(txn.amount, dec!(12.50));
    assert_eq!(txn.category, UNCATEGORIZED);
    assert!(txn.edit_history.is_empty());
    assert_eq!(txn.source, Source::Upload);
}

#[test]
fn test_transaction_json_uses_camel_case() {
    let mut txn = make_txn(dec!(-3));
    txn.bank_account_id = Some("bank-1".into());
    let value = serde_json::to_value(&txn).unwrap();
    assert_eq!(value["bankAccountId"], "bank-1");
    assert_eq!(value["isReconciled"], false);
}

// ── EntryType ─────────────────────────────────────────────────

#[test]
fn test_entry_type_signs() {
    assert_eq!(EntryType::Debit.signed(dec!(-20)), dec!(20));
    assert_eq!(EntryType::Credit.signed(dec!(20)), dec!(-20));
    assert_eq!(EntryType::parse("CR"), Some(EntryType::Credit));
    assert_eq!(EntryType::parse("debit"), Some(EntryType::Debit));
    assert_eq!(EntryType::parse("sideways"), None);
}

// ── EditRecord ────────────────────────────────────────────────

#[test]
fn test_edit_record_builder() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let record = EditRecord::new(ts).change("category", "00000", "6100");
    assert!(!record.is_empty());
    assert_eq!(
        record.changed_fields["category"],
        FieldChange {
            from: "00000".into(),
            to: "6100".into()
        }
    );
    assert!(EditRecord::new(ts).is_empty());
}

// ── Accounts ──────────────────────────────────────────────────

#[test]
fn test_uncategorized_detection() {
    assert!(is_uncategorized("00000"));
    assert!(is_uncategorized(" 00000 "));
    assert!(is_uncategorized(""));
    assert!(!is_uncategorized("1000"));
}

#[test]
fn test_account_type_parse() {
    assert_eq!(AccountType::parse("Accounts Receivable"), AccountType::AccountsReceivable);
    assert_eq!(AccountType::parse("cogs"), AccountType::CostOfSales);
    assert_eq!(AccountType::parse("owner's draw"), AccountType::OwnersDraw);
    assert_eq!(AccountType::parse("whatever"), AccountType::Other);
}

#[test]
fn test_account_type_names_round_trip() {
    for kind in AccountType::all() {
        assert_eq!(AccountType::parse(kind.as_str()), *kind, "{kind}");
    }
}

#[test]
fn test_account_type_categories() {
    assert_eq!(AccountType::Bank.category(), AccountCategory::Asset);
    assert_eq!(AccountType::CreditCard.category(), AccountCategory::Liability);
    assert_eq!(AccountType::OwnersDraw.category(), AccountCategory::Equity);
    assert_eq!(AccountType::OtherIncome.category(), AccountCategory::Revenue);
    assert_eq!(AccountType::OtherExpense.category(), AccountCategory::Expense);
}

#[test]
fn test_accumulated_depreciation_is_contra() {
    let mut account = Account::new(
        "1510".into(),
        "Accumulated Depreciation".into(),
        AccountType::AccumulatedDepreciation,
    );
    assert!(account.is_less_accumulated);
    account.balance = dec!(250);
    assert_eq!(account.reported_balance(), dec!(-250));
    account.balance = dec!(-250);
    assert_eq!(account.reported_balance(), dec!(-250));
}

#[test]
fn test_sign_flip_range() {
    assert!(in_sign_flip_range("4010"));
    assert!(in_sign_flip_range("4000"));
    assert!(!in_sign_flip_range("3999"));
    assert!(!in_sign_flip_range(" 00000 "));
    assert!(!in_sign_flip_range("A-100"));
    assert!(!in_sign_flip_range(""));
    assert!(in_sign_flip_range("99999999999999999999999"));
    assert!(!in_sign_flip_range("0003999"));
}

#[test]
fn test_account_display() {
    let account = Account::new("6100".into(), "Office Supplies".into(), AccountType::Expense);
    assert_eq!(account.to_string(), "6100 Office Supplies");
}

// ── CompanyAggregate ──────────────────────────────────────────

#[test]
fn test_default_chart_has_one_uncategorized() {
    let agg = CompanyAggregate::with_default_chart();
    assert_eq!(agg.accounts.iter().filter(|a| a.is_reserved()).count(), 1);
    assert!(agg.account("4010").is_some());
    assert!(agg.accounts.iter().all(|a| a.balance == Decimal::ZERO));
}

#[test]
fn test_ensure_uncategorized_inserts_missing() {
    let mut agg = CompanyAggregate::default();
    assert!(agg.ensure_uncategorized());
    assert!(agg.account(UNCATEGORIZED).is_some());
    assert!(!agg.ensure_uncategorized());
}

#[test]
fn test_ensure_uncategorized_dedups_and_repairs() {
    let mut agg = CompanyAggregate::default();
    let mut broken = Account::uncategorized();
    broken.is_active = false;
    agg.accounts = vec![broken, Account::uncategorized()];
    assert!(agg.ensure_uncategorized());
    assert_eq!(agg.accounts.len(), 1);
    assert!(agg.accounts[0].is_active);
}

// ── AggregateUpdate ───────────────────────────────────────────

#[test]
fn test_diff_only_carries_changed_arrays() {
    let before = CompanyAggregate::with_default_chart();
    let mut after = before.clone();
    after.transactions.push(make_txn(dec!(5)));

    let update = AggregateUpdate::diff(&before, &after);
    assert!(update.transactions.is_some());
    assert!(update.accounts.is_none());
    assert!(!update.is_empty());
    assert!(AggregateUpdate::diff(&before, &before).is_empty());

    let mut target = before.clone();
    update.apply_to(&mut target);
    assert_eq!(target, after);
}

// ── Recoverable items ─────────────────────────────────────────

#[test]
fn test_recoverable_item_json_shape() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let item = RecoverableItem::new(Removed::Transaction(make_txn(dec!(-9))), ts);
    assert_eq!(item.id(), "t1");
    assert_eq!(item.item_type(), ItemType::Transaction);

    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["removed"]["itemType"], "transaction");
    assert_eq!(value["removed"]["item"]["id"], "t1");

    let back: RecoverableItem = serde_json::from_value(value).unwrap();
    assert_eq!(back, item);
}

#[test]
fn test_category_rule_trims_patterns() {
    let rule = CategoryRule::new("r".into(), "6100".into(), vec![" staples ".into(), " ".into()]);
    assert_eq!(rule.patterns, vec!["staples".to_string()]);
}
