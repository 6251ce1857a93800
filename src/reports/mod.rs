use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::ledger::{balance_as_of, recompute_running};
use crate::models::{Account, AccountCategory, CompanyAggregate};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReportLine {
    pub(crate) account_number: String,
    pub(crate) account_name: String,
    pub(crate) amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Section {
    pub(crate) category: AccountCategory,
    pub(crate) lines: Vec<ReportLine>,
    pub(crate) total: Decimal,
}

impl Section {
    /// One line per account in `category`. Inactive accounts only show when
    /// they carry an amount.
    fn build(
        aggregate: &CompanyAggregate,
        category: AccountCategory,
        amount_of: impl Fn(&Account) -> Decimal,
    ) -> Self {
        let mut lines: Vec<ReportLine> = aggregate
            .accounts
            .iter()
            .filter(|a| !a.is_reserved() && a.category() == category)
            .filter_map(|a| {
                let amount = amount_of(a);
                (a.is_active || !amount.is_zero()).then(|| ReportLine {
                    account_number: a.account_number.clone(),
                    account_name: a.account_name.clone(),
                    amount,
                })
            })
            .collect();
        lines.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        let total = lines.iter().map(|l| l.amount).sum();
        Self {
            category,
            lines,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BalanceSheet {
    pub(crate) as_of: NaiveDate,
    pub(crate) assets: Section,
    pub(crate) liabilities: Section,
    pub(crate) equity: Section,
    /// Revenue less costs and expenses up to `as_of`, not yet closed to equity.
    pub(crate) current_earnings: Decimal,
}

impl BalanceSheet {
    pub(crate) fn total_equity(&self) -> Decimal {
        self.equity.total + self.current_earnings
    }
}

pub(crate) fn balance_sheet(aggregate: &CompanyAggregate, as_of: NaiveDate) -> BalanceSheet {
    let at = |a: &Account| balance_as_of(&aggregate.accounts, &a.account_number, as_of, &aggregate.transactions);
    let earnings_section = |category| Section::build(aggregate, category, at);
    let current_earnings = -(earnings_section(AccountCategory::Revenue).total
        + earnings_section(AccountCategory::CostOfSales).total
        + earnings_section(AccountCategory::Expense).total);

    BalanceSheet {
        as_of,
        assets: Section::build(aggregate, AccountCategory::Asset, at),
        liabilities: Section::build(aggregate, AccountCategory::Liability, at),
        equity: Section::build(aggregate, AccountCategory::Equity, at),
        current_earnings,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IncomeStatement {
    pub(crate) from: NaiveDate,
    pub(crate) to: NaiveDate,
    pub(crate) revenue: Section,
    pub(crate) cost_of_sales: Section,
    pub(crate) expenses: Section,
}

impl IncomeStatement {
    pub(crate) fn gross_profit(&self) -> Decimal {
        self.revenue.total - self.cost_of_sales.total
    }

    pub(crate) fn net_income(&self) -> Decimal {
        self.gross_profit() - self.expenses.total
    }
}

/// Activity between `from` and `to`, both inclusive.
///
/// Revenue reads positive when money came in; costs and expenses read
/// positive when money went out.
pub(crate) fn income_statement(aggregate: &CompanyAggregate, from: NaiveDate, to: NaiveDate) -> IncomeStatement {
    let activity = |a: &Account| {
        let end = balance_as_of(&aggregate.accounts, &a.account_number, to, &aggregate.transactions);
        let start = from
            .pred_opt()
            .map(|before| balance_as_of(&aggregate.accounts, &a.account_number, before, &aggregate.transactions))
            .unwrap_or_default();
        end - start
    };
    let revenue_activity = |a: &Account| -activity(a);

    IncomeStatement {
        from,
        to,
        revenue: Section::build(aggregate, AccountCategory::Revenue, revenue_activity),
        cost_of_sales: Section::build(aggregate, AccountCategory::CostOfSales, activity),
        expenses: Section::build(aggregate, AccountCategory::Expense, activity),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrialBalanceLine {
    pub(crate) account_number: String,
    pub(crate) account_name: String,
    pub(crate) running: Decimal,
    pub(crate) recomputed: Decimal,
}

impl TrialBalanceLine {
    pub(crate) fn drift(&self) -> Decimal {
        self.running - self.recomputed
    }
}

/// Every account's stored running balance next to a fresh fold over the
/// transactions. Any non-zero drift means the books need attention.
pub(crate) fn trial_balance(aggregate: &CompanyAggregate) -> Vec<TrialBalanceLine> {
    let recomputed = recompute_running(&aggregate.accounts, &aggregate.transactions);
    let mut lines: Vec<TrialBalanceLine> = recomputed
        .into_iter()
        .filter_map(|(number, sum)| {
            aggregate.account(&number).map(|a| TrialBalanceLine {
                account_number: number.clone(),
                account_name: a.account_name.clone(),
                running: a.balance,
                recomputed: sum,
            })
        })
        .collect();
    lines.sort_by(|a, b| a.account_number.cmp(&b.account_number));
    let drifting = lines.iter().filter(|l| !l.drift().is_zero()).count();
    if drifting > 0 {
        log::warn!("trial balance: {drifting} account(s) drifted from their transactions");
    }
    lines
}
