use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account number of the permanent "Uncategorized" account.
pub(crate) const UNCATEGORIZED: &str = "00000";

/// Accounts numbered at or above this threshold post with a flipped sign.
const SIGN_FLIP_THRESHOLD: &str = "4000";

/// True when a category reference means "no category assigned".
pub(crate) fn is_uncategorized(category: &str) -> bool {
    let trimmed = category.trim();
    trimmed.is_empty() || trimmed == UNCATEGORIZED
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AccountType {
    Cash,
    Bank,
    AccountsReceivable,
    OtherCurrentAsset,
    FixedAssets,
    AccumulatedDepreciation,
    OtherAsset,
    AccountsPayable,
    CreditCard,
    OtherCurrentLiability,
    LongTermLiability,
    Equity,
    OwnersDraw,
    RetainedEarnings,
    Revenue,
    OtherIncome,
    CostOfSales,
    Expense,
    OtherExpense,
    Other,
}

impl AccountType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Bank => "Bank",
            Self::AccountsReceivable => "Accounts Receivable",
            Self::OtherCurrentAsset => "Other Current Asset",
            Self::FixedAssets => "Fixed Assets",
            Self::AccumulatedDepreciation => "Accumulated Depreciation",
            Self::OtherAsset => "Other Asset",
            Self::AccountsPayable => "Accounts Payable",
            Self::CreditCard => "Credit Card",
            Self::OtherCurrentLiability => "Other Current Liability",
            Self::LongTermLiability => "Long Term Liability",
            Self::Equity => "Equity",
            Self::OwnersDraw => "Owner's Draw",
            Self::RetainedEarnings => "Retained Earnings",
            Self::Revenue => "Revenue",
            Self::OtherIncome => "Other Income",
            Self::CostOfSales => "Cost of Sales",
            Self::Expense => "Expense",
            Self::OtherExpense => "Other Expense",
            Self::Other => "Other",
        }
    }

    pub(crate) fn parse(s: &str) -> Self {
        let key: String = s
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "cash" => Self::Cash,
            "bank" | "checking" | "savings" => Self::Bank,
            "accountsreceivable" | "ar" | "receivable" => Self::AccountsReceivable,
            "othercurrentasset" | "othercurrentassets" => Self::OtherCurrentAsset,
            "fixedassets" | "fixedasset" => Self::FixedAssets,
            "accumulateddepreciation" => Self::AccumulatedDepreciation,
            "otherasset" | "otherassets" => Self::OtherAsset,
            "accountspayable" | "ap" | "payable" => Self::AccountsPayable,
            "creditcard" | "credit" => Self::CreditCard,
            "othercurrentliability" | "othercurrentliabilities" => Self::OtherCurrentLiability,
            "longtermliability" | "longtermliabilities" | "loan" => Self::LongTermLiability,
            "equity" | "ownersequity" => Self::Equity,
            "ownersdraw" | "draw" | "distribution" => Self::OwnersDraw,
            "retainedearnings" => Self::RetainedEarnings,
            "revenue" | "income" | "sales" => Self::Revenue,
            "otherincome" => Self::OtherIncome,
            "costofsales" | "costofgoodssold" | "cogs" => Self::CostOfSales,
            "expense" | "expenses" => Self::Expense,
            "otherexpense" | "otherexpenses" => Self::OtherExpense,
            _ => Self::Other,
        }
    }

    pub(crate) fn all() -> &'static [AccountType] {
        &[
            Self::Cash,
            Self::Bank,
            Self::AccountsReceivable,
            Self::OtherCurrentAsset,
            Self::FixedAssets,
            Self::AccumulatedDepreciation,
            Self::OtherAsset,
            Self::AccountsPayable,
            Self::CreditCard,
            Self::OtherCurrentLiability,
            Self::LongTermLiability,
            Self::Equity,
            Self::OwnersDraw,
            Self::RetainedEarnings,
            Self::Revenue,
            Self::OtherIncome,
            Self::CostOfSales,
            Self::Expense,
            Self::OtherExpense,
            Self::Other,
        ]
    }

    /// The report grouping this type rolls up into.
    pub(crate) fn category(&self) -> AccountCategory {
        match self {
            Self::Cash
            | Self::Bank
            | Self::AccountsReceivable
            | Self::OtherCurrentAsset
            | Self::FixedAssets
            | Self::AccumulatedDepreciation
            | Self::OtherAsset => AccountCategory::Asset,
            Self::AccountsPayable
            | Self::CreditCard
            | Self::OtherCurrentLiability
            | Self::LongTermLiability => AccountCategory::Liability,
            Self::Equity | Self::OwnersDraw | Self::RetainedEarnings => AccountCategory::Equity,
            Self::Revenue | Self::OtherIncome => AccountCategory::Revenue,
            Self::CostOfSales => AccountCategory::CostOfSales,
            Self::Expense | Self::OtherExpense => AccountCategory::Expense,
            Self::Other => AccountCategory::Other,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AccountCategory {
    Asset,
    Liability,
    Equity,
    Revenue,
    CostOfSales,
    Expense,
    Other,
}

impl AccountCategory {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "Asset",
            Self::Liability => "Liability",
            Self::Equity => "Equity",
            Self::Revenue => "Revenue",
            Self::CostOfSales => "Cost of Sales",
            Self::Expense => "Expense",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Account {
    pub(crate) account_number: String,
    pub(crate) account_name: String,
    pub(crate) account_type: AccountType,
    #[serde(default)]
    pub(crate) is_less_accumulated: bool,
    #[serde(default)]
    pub(crate) balance: Decimal,
    #[serde(default = "default_active")]
    pub(crate) is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Account {
    pub(crate) fn new(account_number: String, account_name: String, account_type: AccountType) -> Self {
        Self {
            is_less_accumulated: account_type == AccountType::AccumulatedDepreciation,
            account_number,
            account_name,
            account_type,
            balance: Decimal::ZERO,
            is_active: true,
        }
    }

    pub(crate) fn uncategorized() -> Self {
        Self::new(
            UNCATEGORIZED.to_string(),
            "Uncategorized".to_string(),
            AccountType::Other,
        )
    }

    pub(crate) fn category(&self) -> AccountCategory {
        self.account_type.category()
    }

    pub(crate) fn is_reserved(&self) -> bool {
        self.account_number == UNCATEGORIZED
    }

    /// Balance as shown on reports; contra accounts always read negative.
    pub(crate) fn reported_balance(&self) -> Decimal {
        less_accumulated(self.balance, self.is_less_accumulated)
    }

    /// Find an account by number in a slice.
    pub(crate) fn find<'a>(accounts: &'a [Account], number: &str) -> Option<&'a Account> {
        let number = number.trim();
        accounts.iter().find(|a| a.account_number == number)
    }
}

/// Whether a purely numeric account number is at or above
/// [`SIGN_FLIP_THRESHOLD`]. Compared as digit strings, so any length works.
pub(crate) fn in_sign_flip_range(number: &str) -> bool {
    let number = number.trim();
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let digits = number.trim_start_matches('0');
    (digits.len(), digits) >= (SIGN_FLIP_THRESHOLD.len(), SIGN_FLIP_THRESHOLD)
}

pub(crate) fn less_accumulated(value: Decimal, is_less_accumulated: bool) -> Decimal {
    if is_less_accumulated {
        -value.abs()
    } else {
        value
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.account_number, self.account_name)
    }
}
