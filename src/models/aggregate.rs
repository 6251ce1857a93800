use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Account, AccountType, BankAccount, CategoryRule, Transaction};

/// Everything the engine knows about one company, read and written as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompanyAggregate {
    #[serde(default)]
    pub(crate) transactions: Vec<Transaction>,
    #[serde(default)]
    pub(crate) accounts: Vec<Account>,
    #[serde(default)]
    pub(crate) category_rules: Vec<CategoryRule>,
    #[serde(default)]
    pub(crate) bank_accounts: Vec<BankAccount>,
}

// (number, name, type)
const DEFAULT_CHART: &[(&str, &str, AccountType)] = &[
    ("1000", "Cash", AccountType::Cash),
    ("1100", "Accounts Receivable", AccountType::AccountsReceivable),
    ("1200", "Prepaid Expenses", AccountType::OtherCurrentAsset),
    ("1500", "Equipment", AccountType::FixedAssets),
    ("1510", "Accumulated Depreciation", AccountType::AccumulatedDepreciation),
    ("2000", "Accounts Payable", AccountType::AccountsPayable),
    ("2100", "Credit Card Payable", AccountType::CreditCard),
    ("2500", "Loans Payable", AccountType::LongTermLiability),
    ("3000", "Owner's Equity", AccountType::Equity),
    ("3100", "Owner's Draw", AccountType::OwnersDraw),
    ("3900", "Retained Earnings", AccountType::RetainedEarnings),
    ("4000", "Sales Revenue", AccountType::Revenue),
    ("4010", "Service Revenue", AccountType::Revenue),
    ("4900", "Interest Income", AccountType::OtherIncome),
    ("5000", "Cost of Goods Sold", AccountType::CostOfSales),
    ("6000", "Advertising & Marketing", AccountType::Expense),
    ("6100", "Office Supplies", AccountType::Expense),
    ("6200", "Rent", AccountType::Expense),
    ("6300", "Utilities", AccountType::Expense),
    ("6400", "Software & Subscriptions", AccountType::Expense),
    ("6500", "Travel & Meals", AccountType::Expense),
    ("6600", "Bank Fees", AccountType::Expense),
    ("6700", "Depreciation Expense", AccountType::Expense),
    ("6900", "Miscellaneous Expense", AccountType::OtherExpense),
];

impl CompanyAggregate {
    /// A new company: the Uncategorized account plus a starter chart of accounts.
    pub(crate) fn with_default_chart() -> Self {
        let mut accounts = vec![Account::uncategorized()];
        accounts.extend(
            DEFAULT_CHART
                .iter()
                .map(|(number, name, kind)| Account::new(number.to_string(), name.to_string(), *kind)),
        );
        Self {
            accounts,
            ..Self::default()
        }
    }

    /// Restore the one-reserved-account invariant on data read from storage.
    /// Returns true when the aggregate had to be repaired.
    pub(crate) fn ensure_uncategorized(&mut self) -> bool {
        let mut seen = false;
        let before = self.accounts.len();
        self.accounts.retain(|a| {
            if !a.is_reserved() {
                return true;
            }
            let keep = !seen;
            seen = true;
            keep
        });
        let mut repaired = self.accounts.len() != before;
        if let Some(reserved) = self.accounts.iter_mut().find(|a| a.is_reserved()) {
            if !reserved.is_active || reserved.account_type != AccountType::Other {
                reserved.is_active = true;
                reserved.account_type = AccountType::Other;
                repaired = true;
            }
        } else {
            self.accounts.insert(0, Account::uncategorized());
            repaired = true;
        }
        repaired
    }

    pub(crate) fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub(crate) fn account(&self, number: &str) -> Option<&Account> {
        Account::find(&self.accounts, number)
    }

    pub(crate) fn bank_account(&self, id: &str) -> Option<&BankAccount> {
        self.bank_accounts.iter().find(|b| b.id == id)
    }
}

/// A version-stamped read of an aggregate, used for optimistic writes.
#[derive(Debug, Clone)]
pub(crate) struct Versioned<T> {
    pub(crate) value: T,
    pub(crate) version: u64,
}

/// Partial overwrite of an aggregate. Each present field replaces the whole array.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AggregateUpdate {
    pub(crate) transactions: Option<Vec<Transaction>>,
    pub(crate) accounts: Option<Vec<Account>>,
    pub(crate) category_rules: Option<Vec<CategoryRule>>,
    pub(crate) bank_accounts: Option<Vec<BankAccount>>,
}

impl AggregateUpdate {
    /// Only the arrays that differ between `before` and `after`.
    pub(crate) fn diff(before: &CompanyAggregate, after: &CompanyAggregate) -> Self {
        Self {
            transactions: (before.transactions != after.transactions)
                .then(|| after.transactions.clone()),
            accounts: (before.accounts != after.accounts).then(|| after.accounts.clone()),
            category_rules: (before.category_rules != after.category_rules)
                .then(|| after.category_rules.clone()),
            bank_accounts: (before.bank_accounts != after.bank_accounts)
                .then(|| after.bank_accounts.clone()),
        }
    }

    pub(crate) fn full(aggregate: &CompanyAggregate) -> Self {
        Self {
            transactions: Some(aggregate.transactions.clone()),
            accounts: Some(aggregate.accounts.clone()),
            category_rules: Some(aggregate.category_rules.clone()),
            bank_accounts: Some(aggregate.bank_accounts.clone()),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.transactions.is_none()
            && self.accounts.is_none()
            && self.category_rules.is_none()
            && self.bank_accounts.is_none()
    }

    pub(crate) fn apply_to(self, aggregate: &mut CompanyAggregate) {
        if let Some(t) = self.transactions {
            aggregate.transactions = t;
        }
        if let Some(a) = self.accounts {
            aggregate.accounts = a;
        }
        if let Some(r) = self.category_rules {
            aggregate.category_rules = r;
        }
        if let Some(b) = self.bank_accounts {
            aggregate.bank_accounts = b;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum ItemType {
    Transaction,
    Account,
    CategoryRule,
}

impl ItemType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Account => "account",
            Self::CategoryRule => "categoryRule",
        }
    }
}

/// Something removed from the active aggregate that can still be brought back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "itemType", content = "item", rename_all = "camelCase")]
pub(crate) enum Removed {
    Transaction(Transaction),
    Account(Account),
    CategoryRule(CategoryRule),
}

impl Removed {
    pub(crate) fn id(&self) -> &str {
        match self {
            Self::Transaction(t) => &t.id,
            Self::Account(a) => &a.account_number,
            Self::CategoryRule(r) => &r.id,
        }
    }

    pub(crate) fn item_type(&self) -> ItemType {
        match self {
            Self::Transaction(_) => ItemType::Transaction,
            Self::Account(_) => ItemType::Account,
            Self::CategoryRule(_) => ItemType::CategoryRule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecoverableItem {
    pub(crate) deleted_at: DateTime<Utc>,
    pub(crate) removed: Removed,
}

impl RecoverableItem {
    pub(crate) fn new(removed: Removed, deleted_at: DateTime<Utc>) -> Self {
        Self {
            deleted_at,
            removed,
        }
    }

    pub(crate) fn id(&self) -> &str {
        self.removed.id()
    }

    pub(crate) fn item_type(&self) -> ItemType {
        self.removed.item_type()
    }
}
