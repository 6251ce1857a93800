use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A real bank or card account. Its balance follows raw cash-basis signs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BankAccount {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) institution: String,
    #[serde(default)]
    pub(crate) last_four: String,
    #[serde(default)]
    pub(crate) balance: Decimal,
}

impl BankAccount {
    pub(crate) fn new(id: String, name: String, institution: String) -> Self {
        Self {
            id,
            name,
            institution,
            last_four: String::new(),
            balance: Decimal::ZERO,
        }
    }
}
