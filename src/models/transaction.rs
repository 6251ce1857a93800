use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::{is_uncategorized, UNCATEGORIZED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Source {
    Manual,
    Upload,
    Reconciliation,
}

impl Source {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Upload => "upload",
            Self::Reconciliation => "reconciliation",
        }
    }

    /// Bank-fed sources must name the bank account the money moved through.
    pub(crate) fn requires_bank_account(&self) -> bool {
        matches!(self, Self::Manual | Self::Upload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "dr" => Some(Self::Debit),
            "credit" | "cr" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Offset amounts are always positive for debits and negative for credits.
    pub(crate) fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Debit => amount.abs(),
            Self::Credit => -amount.abs(),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FieldChange {
    pub(crate) from: String,
    pub(crate) to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EditRecord {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) changed_fields: BTreeMap<String, FieldChange>,
}

impl EditRecord {
    pub(crate) fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            changed_fields: BTreeMap::new(),
        }
    }

    pub(crate) fn change(mut self, field: &str, from: impl ToString, to: impl ToString) -> Self {
        self.changed_fields.insert(
            field.to_string(),
            FieldChange {
                from: from.to_string(),
                to: to.to_string(),
            },
        );
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.changed_fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Transaction {
    pub(crate) id: String,
    pub(crate) date: NaiveDate,
    pub(crate) description: String,
    pub(crate) amount: Decimal,
    #[serde(default = "default_category")]
    pub(crate) category: String,
    #[serde(default)]
    pub(crate) bank_account_id: Option<String>,
    pub(crate) source: Source,
    #[serde(default)]
    pub(crate) excluded: bool,

    #[serde(default)]
    pub(crate) is_reconciled: bool,
    #[serde(default)]
    pub(crate) offset_category: Option<String>,
    #[serde(default)]
    pub(crate) offset_amount: Option<Decimal>,
    #[serde(default)]
    pub(crate) offset_description: Option<String>,
    #[serde(default)]
    pub(crate) offset_transaction_id: Option<String>,

    #[serde(default)]
    pub(crate) is_journal_entry: bool,
    #[serde(default)]
    pub(crate) journal_entry_id: Option<String>,
    #[serde(default)]
    pub(crate) entry_type: Option<EntryType>,
    #[serde(default)]
    pub(crate) related_transaction_id: Option<String>,

    #[serde(default)]
    pub(crate) edit_history: Vec<EditRecord>,
}

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

impl Transaction {
    pub(crate) fn new(
        id: String,
        date: NaiveDate,
        description: String,
        amount: Decimal,
        source: Source,
    ) -> Self {
        Self {
            id,
            date,
            description,
            amount,
            category: default_category(),
            bank_account_id: None,
            source,
            excluded: false,
            is_reconciled: false,
            offset_category: None,
            offset_amount: None,
            offset_description: None,
            offset_transaction_id: None,
            is_journal_entry: false,
            journal_entry_id: None,
            entry_type: None,
            related_transaction_id: None,
            edit_history: Vec::new(),
        }
    }

    pub(crate) fn is_categorized(&self) -> bool {
        !is_uncategorized(&self.category)
    }

    pub(crate) fn has_offset(&self) -> bool {
        self.offset_transaction_id.is_some()
    }

    /// `YYYY-MM` of the transaction date.
    pub(crate) fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Parameters for a transaction entered by hand or read from an upload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewTransaction {
    pub(crate) date: NaiveDate,
    pub(crate) description: String,
    pub(crate) amount: Decimal,
    pub(crate) category: String,
    pub(crate) bank_account_id: Option<String>,
    pub(crate) source: Source,
}

impl NewTransaction {
    pub(crate) fn manual(date: NaiveDate, description: String, amount: Decimal) -> Self {
        Self {
            date,
            description,
            amount,
            category: default_category(),
            bank_account_id: None,
            source: Source::Manual,
        }
    }

    pub(crate) fn in_category(mut self, category: &str) -> Self {
        self.category = category.trim().to_string();
        self
    }

    pub(crate) fn through_bank(mut self, bank_account_id: &str) -> Self {
        self.bank_account_id = Some(bank_account_id.to_string());
        self
    }
}
