use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::models::CompanyAggregate;
use crate::store::{self, TransactionFilter};

const HEADER: [&str; 12] = [
    "id",
    "date",
    "description",
    "amount",
    "category",
    "category_name",
    "bank_account",
    "source",
    "excluded",
    "reconciled",
    "offset_category",
    "offset_amount",
];

/// Write transactions as CSV, optionally limited to one `YYYY-MM` month.
/// Returns the number of rows written.
pub(crate) fn write_transactions_csv<W: Write>(
    writer: W,
    aggregate: &CompanyAggregate,
    month: Option<&str>,
) -> Result<usize> {
    let filter = TransactionFilter {
        month: month.map(str::to_string),
        ..TransactionFilter::default()
    };
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    let mut rows: Vec<_> = store::filter(&aggregate.transactions, &filter).collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date));

    for txn in &rows {
        let category_name = aggregate
            .account(&txn.category)
            .map(|a| a.account_name.as_str())
            .unwrap_or_default();
        let date = txn.date.format("%Y-%m-%d").to_string();
        let amount = txn.amount.to_string();
        let offset_amount = txn.offset_amount.map(|a| a.to_string()).unwrap_or_default();
        let record: [&str; 12] = [
            &txn.id,
            &date,
            &txn.description,
            &amount,
            &txn.category,
            category_name,
            txn.bank_account_id.as_deref().unwrap_or_default(),
            txn.source.as_str(),
            if txn.excluded { "true" } else { "false" },
            if txn.is_reconciled { "true" } else { "false" },
            txn.offset_category.as_deref().unwrap_or_default(),
            &offset_amount,
        ];
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

pub(crate) fn export_to_csv(path: &Path, aggregate: &CompanyAggregate, month: Option<&str>) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_transactions_csv(file, aggregate, month)
}
