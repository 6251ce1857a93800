#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;

fn make_csv_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ── Amounts and dates ─────────────────────────────────────────

#[test]
fn test_parse_money_statement_formats() {
    let cases = [
        ("100.50", dec!(100.50)),
        ("-42.99", dec!(-42.99)),
        ("$1,234,567.89", dec!(1234567.89)),
        ("-$99.99", dec!(-99.99)),
        ("(500.00)", dec!(-500.00)),
        ("\"100.00\"", dec!(100.00)),
        ("  ", Decimal::ZERO),
    ];
    for (text, expected) in cases {
        assert_eq!(parse_money(text).unwrap(), expected, "{text}");
    }
    assert!(parse_money("n/a").is_err());
}

#[test]
fn test_parse_date_tries_fallback_formats() {
    let jan_15 = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    // The profile says US dates; the file disagrees.
    assert_eq!(parse_date("2024-01-15", "%m/%d/%Y").unwrap(), jan_15);
    assert_eq!(parse_date("01/15/24", "%m/%d/%y").unwrap(), jan_15);
    assert_eq!(parse_date("01-15-2024", "%Y-%m-%d").unwrap(), jan_15);
    assert!(parse_date("", "%m/%d/%Y").is_err());
    assert!(parse_date("Pending", "%m/%d/%Y").is_err());
}

#[test]
fn test_parse_amount_split_columns_use_direction() {
    let profile = CsvProfile::from_headers(&headers(&["Date", "Payee", "Withdrawal", "Deposit"]));
    let row = |out: &str, inn: &str| vec!["01/15/2024".to_string(), "x".into(), out.into(), inn.into()];
    // Some banks print withdrawals already negative.
    assert_eq!(parse_amount(&row("-4.50", ""), &profile).unwrap(), dec!(-4.50));
    assert_eq!(parse_amount(&row("4.50", ""), &profile).unwrap(), dec!(-4.50));
    assert_eq!(parse_amount(&row("", "1,000.00"), &profile).unwrap(), dec!(1000.00));
    assert_eq!(parse_amount(&row("", ""), &profile).unwrap(), Decimal::ZERO);
}

#[test]
fn test_parse_amount_card_statement_negated() {
    // Card statements print charges as positive.
    let profile = CsvProfile {
        negate_amounts: true,
        ..CsvProfile::default()
    };
    let row = vec!["01/15/2024".into(), "Coffee".into(), "4.50".into()];
    assert_eq!(parse_amount(&row, &profile).unwrap(), dec!(-4.50));
}

// ── CsvImporter::preview ──────────────────────────────────────

#[test]
fn test_preview_splits_header_from_rows() {
    let file = make_csv_file("Date,Description,Amount\n01/15/2024,\"Coffee, Shop\",-4.50\n01/16/2024,Lunch,-12.00\n");
    let (headers, rows) = CsvImporter::preview(file.path()).unwrap();
    assert_eq!(headers, vec!["Date", "Description", "Amount"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1], "Coffee, Shop");
}

#[test]
fn test_preview_headerless_statement_gets_column_names() {
    let file = make_csv_file("01/15/2024,-4.50,*,,COFFEE SHOP\n01/16/2024,-12.00,*,,RESTAURANT\n");
    let (headers, rows) = CsvImporter::preview(file.path()).unwrap();
    assert_eq!(headers, vec!["Column 1", "Column 2", "Column 3", "Column 4", "Column 5"]);
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_preview_empty_file_fails() {
    let file = make_csv_file("");
    assert!(CsvImporter::preview(file.path()).is_err());
}

// ── CsvImporter::parse ────────────────────────────────────────

#[test]
fn test_parse_basic_rows() {
    let profile = CsvProfile::default();
    let rows = vec![
        vec!["01/15/2024".into(), "Coffee".into(), "-4.50".into()],
        vec!["01/16/2024".into(), "Lunch".into(), "-12.00".into()],
    ];
    let txns = CsvImporter::parse(&rows, &profile, "b1").unwrap();
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].date, chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert_eq!(txns[0].description, "Coffee");
    assert_eq!(txns[0].amount, dec!(-4.50));
}

#[test]
fn test_parse_marks_rows_as_uploaded() {
    let profile = CsvProfile::default();
    let rows = vec![vec!["01/15/2024".into(), "Coffee".into(), "-4.50".into()]];
    let txns = CsvImporter::parse(&rows, &profile, "b1").unwrap();
    assert_eq!(txns[0].source, Source::Upload);
    assert_eq!(txns[0].bank_account_id.as_deref(), Some("b1"));
    assert!(crate::models::is_uncategorized(&txns[0].category));
}

#[test]
fn test_parse_skips_empty_dates() {
    let profile = CsvProfile::default();
    let rows = vec![
        vec!["01/15/2024".into(), "Coffee".into(), "-4.50".into()],
        vec!["".into(), "".into(), "".into()],
        vec!["01/16/2024".into(), "Lunch".into(), "-12.00".into()],
    ];
    let txns = CsvImporter::parse(&rows, &profile, "b1").unwrap();
    assert_eq!(txns.len(), 2);
}

#[test]
fn test_parse_bad_amount_names_the_row() {
    let profile = CsvProfile::default();
    let rows = vec![
        vec!["01/15/2024".into(), "Coffee".into(), "-4.50".into()],
        vec!["01/16/2024".into(), "Lunch".into(), "twelve".into()],
    ];
    let err = CsvImporter::parse(&rows, &profile, "b1").unwrap_err();
    assert!(err.to_string().starts_with("Row 2"));
}

#[test]
fn test_parse_empty_rows() {
    let profile = CsvProfile::default();
    let rows: Vec<Vec<String>> = vec![];
    let txns = CsvImporter::parse(&rows, &profile, "b1").unwrap();
    assert!(txns.is_empty());
}

// ── CsvProfile::from_headers ──────────────────────────────────

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_profile_single_amount_column() {
    let profile = CsvProfile::from_headers(&headers(&["Posted Date", "Reference Number", "Payee", "Address", "Amount"]));
    assert_eq!(profile.date_column, 0);
    assert_eq!(profile.description_column, 2);
    assert_eq!(profile.amount_column, Some(4));
    assert_eq!(profile.debit_column, None);
}

#[test]
fn test_profile_debit_credit_columns() {
    let profile = CsvProfile::from_headers(&headers(&["Transaction Date", "Description", "Debit", "Credit", "Balance"]));
    assert_eq!(profile.date_column, 0);
    assert_eq!(profile.description_column, 1);
    assert_eq!(profile.amount_column, None);
    assert_eq!(profile.debit_column, Some(2));
    assert_eq!(profile.credit_column, Some(3));
}

#[test]
fn test_profile_prefers_exact_header() {
    let profile = CsvProfile::from_headers(&headers(&["Post Date", "Date", "Memo", "Amount"]));
    assert_eq!(profile.date_column, 1);
    assert_eq!(profile.description_column, 2);
}

#[test]
fn test_profile_generic_headers_fall_back() {
    let profile = CsvProfile::from_headers(&headers(&["Column 1", "Column 2", "Column 3"]));
    assert_eq!(profile, CsvProfile::default());
}

#[test]
fn test_preview_then_parse_file() {
    let csv = "Date,Description,Withdrawal,Deposit\n2024-03-01,Office Depot,25.10,\n2024-03-02,Client payment,,900.00\n";
    let file = make_csv_file(csv);
    let (headers, rows) = CsvImporter::preview(file.path()).unwrap();
    let profile = CsvProfile::from_headers(&headers);
    let txns = CsvImporter::parse(&rows, &profile, "b1").unwrap();
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].amount, dec!(-25.10));
    assert_eq!(txns[1].amount, dec!(900.00));
}
