use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::{NewTransaction, Source};

/// Where the fields of a bank statement row live.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CsvProfile {
    pub(crate) date_column: usize,
    pub(crate) description_column: usize,
    pub(crate) amount_column: Option<usize>,
    pub(crate) debit_column: Option<usize>,
    pub(crate) credit_column: Option<usize>,
    pub(crate) date_format: String,
    pub(crate) negate_amounts: bool,
}

impl Default for CsvProfile {
    fn default() -> Self {
        Self {
            date_column: 0,
            description_column: 1,
            amount_column: Some(2),
            debit_column: None,
            credit_column: None,
            date_format: "%m/%d/%Y".into(),
            negate_amounts: false,
        }
    }
}

impl CsvProfile {
    /// Guess the columns from a header row. Falls back to the default
    /// layout for anything it cannot find.
    pub(crate) fn from_headers(headers: &[String]) -> Self {
        let h: Vec<String> = headers.iter().map(|s| s.trim().to_lowercase()).collect();
        let fallback = Self::default();

        let date_column = col_matching(&h, &["posted date", "posting date", "transaction date", "date"])
            .unwrap_or(fallback.date_column);
        let description_column = col_matching(&h, &["description", "payee", "memo", "name"])
            .unwrap_or(fallback.description_column);
        let amount_column = col_matching(&h, &["amount"]);
        let debit_column = col_matching(&h, &["debit", "withdrawal"]);
        let credit_column = col_matching(&h, &["credit", "deposit"]);

        let split = amount_column.is_none() && (debit_column.is_some() || credit_column.is_some());
        Self {
            date_column,
            description_column,
            amount_column: if split { None } else { amount_column.or(fallback.amount_column) },
            debit_column: if split { debit_column } else { None },
            credit_column: if split { credit_column } else { None },
            ..fallback
        }
    }
}

/// First column whose header equals, then contains, one of `names`, tried in order.
fn col_matching(headers: &[String], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
        .or_else(|| {
            names
                .iter()
                .find_map(|name| headers.iter().position(|h| h.contains(name)))
        })
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    /// Read a statement into a header row and data rows. A first row with
    /// no date or amount in it is taken as the header; otherwise the
    /// columns are named "Column 1", "Column 2", ...
    pub(crate) fn preview(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let mut rows = rdr
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read CSV record")?;

        let Some(first) = rows.first() else {
            anyhow::bail!("CSV file is empty");
        };
        let width = first.len();
        if first.iter().any(|field| looks_like_value(field)) {
            let headers: Vec<String> = (1..=width).map(|i| format!("Column {i}")).collect();
            return Ok((headers, rows));
        }
        let headers = rows.remove(0);
        Ok((headers, rows))
    }

    /// Turn statement rows into uploaded transactions for one bank account.
    /// Rows without a date are skipped.
    pub(crate) fn parse(
        rows: &[Vec<String>],
        profile: &CsvProfile,
        bank_account_id: &str,
    ) -> Result<Vec<NewTransaction>> {
        let mut transactions = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            let date_str = row
                .get(profile.date_column)
                .map(|s| s.trim().to_string())
                .unwrap_or_default();

            if date_str.is_empty() {
                continue;
            }

            let date = parse_date(&date_str, &profile.date_format)
                .with_context(|| format!("Row {}: failed to parse date '{}'", i + 1, date_str))?;

            let description = row
                .get(profile.description_column)
                .map(|s| s.trim().to_string())
                .unwrap_or_default();

            let amount = parse_amount(row, profile)
                .with_context(|| format!("Row {}: failed to parse amount", i + 1))?;

            transactions.push(NewTransaction {
                source: Source::Upload,
                ..NewTransaction::manual(date, description, amount).through_bank(bank_account_id)
            });
        }

        Ok(transactions)
    }
}

/// Formats tried after the profile's own, most common first.
const DATE_FALLBACKS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%m-%d-%Y", "%m/%d/%y", "%d/%m/%Y"];

fn parse_date(s: &str, fmt: &str) -> Result<NaiveDate> {
    std::iter::once(fmt)
        .chain(DATE_FALLBACKS.iter().copied())
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .with_context(|| format!("Could not parse date: {s}"))
}

/// A date or an amount, as opposed to header text.
fn looks_like_value(field: &str) -> bool {
    let field = field.trim();
    !field.is_empty() && (parse_money(field).is_ok() || parse_date(field, "%Y-%m-%d").is_ok())
}

fn cell(row: &[String], column: Option<usize>) -> &str {
    column.and_then(|c| row.get(c)).map_or("", |s| s.trim())
}

/// The signed amount of a row. With split columns a debit is money out
/// and a credit money in, whatever sign the bank printed.
fn parse_amount(row: &[String], profile: &CsvProfile) -> Result<Decimal> {
    let amount = if profile.amount_column.is_some() {
        parse_money(cell(row, profile.amount_column))?
    } else {
        let debit = cell(row, profile.debit_column);
        if debit.is_empty() {
            parse_money(cell(row, profile.credit_column))?.abs()
        } else {
            -parse_money(debit)?.abs()
        }
    };
    Ok(if profile.negate_amounts { -amount } else { amount })
}

/// Statement money text: `$1,234.56`, `-$5`, `(500.00)` for a negative,
/// optionally quoted. Blank is zero.
fn parse_money(s: &str) -> Result<Decimal> {
    let text = s.trim().trim_matches('"').trim();
    let (negative, text) = match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, text),
    };
    let digits: String = text.chars().filter(|c| !matches!(c, '$' | ',')).collect();
    let digits = digits.trim();
    if digits.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let value = Decimal::from_str(digits).with_context(|| format!("'{s}' is not an amount"))?;
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
