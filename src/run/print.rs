use rust_decimal::Decimal;

use crate::duplicates::DuplicateGroup;
use crate::models::{Account, BankAccount, CategoryRule, CompanyAggregate, RecoverableItem, Removed, Transaction};
use crate::reconcile::Outcome;
use crate::reports::{BalanceSheet, IncomeStatement, Section, TrialBalanceLine};

fn rule(width: usize) {
    println!("{}", "─".repeat(width));
}

pub(super) fn outcome(outcome: &Outcome) {
    match outcome.changed.len() {
        0 if outcome.removed.is_empty() => println!("Nothing to change"),
        0 => {}
        n => println!("Saved {n} change(s)"),
    }
    for removed in &outcome.removed {
        println!("Deleted {} {} (recoverable)", removed.item_type().as_str(), removed.id());
    }
    problems(outcome);
}

/// Skipped items and balance warnings, on stderr.
pub(super) fn problems(outcome: &Outcome) {
    for skipped in &outcome.skipped {
        eprintln!("Skipped {}: {}", skipped.id, skipped.reason);
    }
    for warning in &outcome.warnings {
        eprintln!("Warning: {warning}");
    }
}

pub(super) fn accounts(accounts: &[Account]) {
    println!("{:<8} {:<28} {:<26} {:>12}", "Number", "Name", "Type", "Balance");
    rule(77);
    for acct in accounts {
        let name = if acct.is_active {
            acct.account_name.clone()
        } else {
            format!("{} (inactive)", acct.account_name)
        };
        println!(
            "{:<8} {:<28} {:<26} {:>12.2}",
            acct.account_number,
            name,
            acct.account_type.as_str(),
            acct.reported_balance(),
        );
    }
}

pub(super) fn bank_accounts(banks: &[BankAccount]) {
    if banks.is_empty() {
        println!("No bank accounts");
        return;
    }
    println!("{:<38} {:<20} {:<16} {:>12}", "ID", "Name", "Institution", "Balance");
    rule(89);
    for bank in banks {
        println!(
            "{:<38} {:<20} {:<16} {:>12.2}",
            bank.id, bank.name, bank.institution, bank.balance
        );
    }
}

pub(super) fn transactions(rows: &[&Transaction], aggregate: &CompanyAggregate) {
    if rows.is_empty() {
        println!("No transactions");
        return;
    }
    println!("{:<36} {:<10} {:<30} {:>11} {:<24} Flags", "ID", "Date", "Description", "Amount", "Category");
    rule(122);
    for txn in rows {
        let category = aggregate
            .account(&txn.category)
            .map(|a| format!("{} {}", a.account_number, a.account_name))
            .unwrap_or_else(|| txn.category.clone());
        let mut flags = Vec::new();
        if txn.is_reconciled {
            flags.push("R");
        }
        if txn.is_journal_entry {
            flags.push("J");
        }
        if txn.excluded {
            flags.push("X");
        }
        println!(
            "{:<36} {:<10} {:<30} {:>11.2} {:<24} {}",
            txn.id,
            txn.date.format("%Y-%m-%d").to_string(),
            truncate(&txn.description, 30),
            txn.amount,
            truncate(&category, 24),
            flags.join(""),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

pub(super) fn recoverable(items: &[RecoverableItem]) {
    if items.is_empty() {
        println!("Nothing to restore");
        return;
    }
    println!("{:<36} {:<13} {:<17} Item", "ID", "Type", "Deleted");
    rule(90);
    for item in items {
        let summary = match &item.removed {
            Removed::Transaction(t) => format!("{} {} {:.2}", t.date, t.description, t.amount),
            Removed::Account(a) => format!("{} {}", a.account_number, a.account_name),
            Removed::CategoryRule(r) => format!("{} <- {}", r.category, r.patterns.join(", ")),
        };
        println!(
            "{:<36} {:<13} {:<17} {}",
            item.id(),
            item.item_type().as_str(),
            item.deleted_at.format("%Y-%m-%d %H:%M").to_string(),
            summary
        );
    }
}

pub(super) fn rules(rules: &[CategoryRule]) {
    if rules.is_empty() {
        println!("No category rules");
        return;
    }
    println!("{:<36} {:<10} Keywords", "ID", "Category");
    rule(70);
    for r in rules {
        println!("{:<36} {:<10} {}", r.id, r.category, r.patterns.join(", "));
    }
}

pub(super) fn duplicates(groups: &[DuplicateGroup]) {
    if groups.is_empty() {
        println!("No duplicates found");
        return;
    }
    for group in groups {
        println!(
            "{}  {}  {:.2}  x{}",
            group.month,
            group.description,
            group.amount,
            group.len()
        );
        for id in &group.transaction_ids {
            println!("    {id}");
        }
    }
}

fn section(section: &Section) {
    let title = section.category.as_str();
    println!("{title}");
    for line in &section.lines {
        println!("  {:<8} {:<30} {:>12.2}", line.account_number, line.account_name, line.amount);
    }
    println!("  {:<39} {:>12.2}", format!("Total {title}"), section.total);
    println!();
}

fn total(label: &str, amount: Decimal) {
    println!("{label:<41} {amount:>12.2}");
}

pub(super) fn balance_sheet(sheet: &BalanceSheet) {
    println!("Balance Sheet as of {}", sheet.as_of);
    rule(54);
    section(&sheet.assets);
    section(&sheet.liabilities);
    section(&sheet.equity);
    total("Current earnings", sheet.current_earnings);
    total("Total equity", sheet.total_equity());
    total("Liabilities and equity", sheet.liabilities.total + sheet.total_equity());
}

pub(super) fn income_statement(report: &IncomeStatement) {
    println!("Income Statement {} to {}", report.from, report.to);
    rule(54);
    section(&report.revenue);
    section(&report.cost_of_sales);
    total("Gross profit", report.gross_profit());
    println!();
    section(&report.expenses);
    total("Net income", report.net_income());
}

pub(super) fn trial_balance(lines: &[TrialBalanceLine]) {
    println!("{:<8} {:<30} {:>12} {:>12} {:>10}", "Number", "Name", "Running", "Recomputed", "Drift");
    rule(76);
    for line in lines {
        let marker = if line.drift().is_zero() { "" } else { "  !" };
        println!(
            "{:<8} {:<30} {:>12.2} {:>12.2} {:>10.2}{marker}",
            line.account_number,
            truncate(&line.account_name, 30),
            line.running,
            line.recomputed,
            line.drift(),
        );
    }
    let drifting = lines.iter().filter(|l| !l.drift().is_zero()).count();
    if drifting > 0 {
        eprintln!("Warning: {drifting} account(s) do not match their transactions");
    }
}
