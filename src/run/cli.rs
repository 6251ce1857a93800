use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::config::Settings;
use crate::db::{export_to_csv, Database};
use crate::ledger::AccountPatch;
use crate::models::{Account, AccountType, BankAccount, EntryType, NewTransaction};
use crate::reconcile::{Intent, JournalPair, OffsetSpec, TransactionEdit};
use crate::service::Bookkeeper;
use crate::store::{self, CategoryState, TransactionFilter};

use super::print;

pub(crate) fn as_cli(args: &[String], books: &Bookkeeper<Database>, settings: &Settings) -> Result<()> {
    let rest = &args[2..];
    let company = flag(rest, "--company").unwrap_or(&settings.company_id);

    match args[1].as_str() {
        "init" => cli_init(books, company),
        "companies" => {
            for id in books.store().list_companies()? {
                println!("{id}");
            }
            Ok(())
        }
        "accounts" => cli_accounts(books, company),
        "add-account" => cli_add_account(rest, books, company),
        "update-account" => cli_update_account(rest, books, company),
        "retype-accounts" => cli_retype_accounts(rest, books, company),
        "delete-account" => {
            let number = required(rest, 0, "delete-account <number>")?;
            run(books, company, Intent::DeleteAccount { account_number: number.into() })
        }
        "bank-accounts" => cli_bank_accounts(books, company),
        "add-bank" => cli_add_bank(rest, books, company),
        "transactions" | "t" => cli_transactions(rest, books, company),
        "add" => cli_add(rest, books, company),
        "edit" => cli_edit(rest, books, company),
        "categorize" => cli_categorize(rest, books, company),
        "auto-categorize" => run(books, company, Intent::AutoCategorize),
        "delete" => {
            let id = required(rest, 0, "delete <transaction-id>")?;
            run(books, company, Intent::DeleteTransaction { transaction_id: id.into() })
        }
        "restore" => {
            let id = required(rest, 0, "restore <item-id>")?;
            let outcome = books.restore_deleted(company, id)?;
            print::outcome(&outcome);
            Ok(())
        }
        "recoverable" => {
            print::recoverable(&books.list_recoverable(company)?);
            Ok(())
        }
        "exclude" => run(books, company, Intent::BulkExclude { transaction_ids: ids(rest) }),
        "include" => run(books, company, Intent::BulkInclude { transaction_ids: ids(rest) }),
        "reconcile" => cli_reconcile(rest, books, company),
        "unreconcile" => run(books, company, Intent::UndoReconciliation { transaction_ids: ids(rest) }),
        "offset" => cli_offset(rest, books, company),
        "journal" => cli_journal(rest, books, company),
        "rules" => cli_rules(books, company),
        "add-rule" => cli_add_rule(rest, books, company),
        "update-rule" => cli_update_rule(rest, books, company),
        "delete-rule" => {
            let id = required(rest, 0, "delete-rule <rule-id>")?;
            run(books, company, Intent::DeleteRule { rule_id: id.into() })
        }
        "duplicates" => {
            print::duplicates(&books.duplicates(company)?);
            Ok(())
        }
        "balance-sheet" => cli_balance_sheet(rest, books, company),
        "income" => cli_income(rest, books, company),
        "trial-balance" => {
            let aggregate = books.load(company)?;
            print::trial_balance(&crate::reports::trial_balance(&aggregate));
            Ok(())
        }
        "import" => cli_import(rest, books, company),
        "export" => cli_export(rest, books, company),
        "config" => cli_config(rest, settings),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("bookkeep {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("bookkeep: small-business books on a local database");
    println!();
    println!("Usage: bookkeep <command> [args] [--company <id>]");
    println!();
    println!("Companies and accounts:");
    println!("  init                                   Create the company with a starter chart of accounts");
    println!("  companies                              List companies");
    println!("  accounts                               Chart of accounts with balances");
    println!("  add-account <number> <name> <type>     Add an account");
    println!("  update-account <number>                Change an account");
    println!("    --name <name> --type <type> --active <true|false>");
    println!("  retype-accounts <type> <number>...     Change the type of several accounts");
    println!("  delete-account <number>                Delete an account; its transactions become uncategorized");
    println!("  bank-accounts                          List bank accounts");
    println!("  add-bank <name> [--id <id>] [--institution <name>]");
    println!(
        "  Account types: {}",
        AccountType::all().iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    );
    println!();
    println!("Transactions:");
    println!("  transactions [--month YYYY-MM] [--bank <id>] [--state all|uncategorized|categorized|excluded]");
    println!("  add <YYYY-MM-DD> <description> <amount> [--category <number>] [--bank <id>]");
    println!("  edit <id> [--description <text>] [--date YYYY-MM-DD] [--amount <amount>]");
    println!("  categorize <number> <id>...            Move transactions to an account");
    println!("  auto-categorize                        Apply category rules to uncategorized transactions");
    println!("  delete <id>                            Delete a transaction (recoverable)");
    println!("  recoverable                            List deleted items");
    println!("  restore <id>                           Bring a deleted item back");
    println!("  exclude <id>... | include <id>...      Hide or unhide transactions");
    println!("  duplicates                             Show probable duplicate transactions");
    println!();
    println!("Reconciliation:");
    println!("  reconcile <number> <debit|credit> <id>... [--description <text>] [--amount <amount>]");
    println!("  unreconcile <id>...                    Undo reconciliation");
    println!("  offset <id> <number> <debit|credit> [--description <text>] [--amount <amount>]");
    println!("  journal <YYYY-MM-DD> <description> <debit>:<credit>:<amount>...");
    println!();
    println!("Rules:");
    println!("  rules                                  List rules and suggestions");
    println!("  add-rule <number> <keyword>...         Add a category rule");
    println!("  update-rule <id> [--category <number>] [--keywords <a,b,...>]");
    println!("  delete-rule <id>                       Delete a rule (recoverable)");
    println!();
    println!("Reports and files:");
    println!("  balance-sheet [--as-of YYYY-MM-DD]");
    println!("  income [--from YYYY-MM-DD] [--to YYYY-MM-DD]");
    println!("  trial-balance                          Running balances against recomputed balances");
    println!("  import <file.csv> [--bank <id>]        Import a bank statement");
    println!("  export [path] [--month YYYY-MM]        Export transactions to CSV");
    println!("  config [<key> <value>]                 Show or change settings");
    println!("  --help, -h                             Show this help");
    println!("  --version, -V                          Show version");
}

// ── Argument helpers ─────────────────────────────────────────

pub(crate) fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].as_str())
}

/// Arguments that are neither `--flag`s nor their values.
pub(crate) fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn required<'a>(args: &'a [String], index: usize, usage: &str) -> Result<&'a str> {
    positionals(args)
        .get(index)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Usage: bookkeep {usage}"))
}

fn ids(args: &[String]) -> Vec<String> {
    positionals(args).into_iter().map(str::to_string).collect()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

pub(crate) fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(&s.trim().replace([',', '$'], "")).with_context(|| format!("Invalid amount '{s}'"))
}

fn parse_entry_type(s: &str) -> Result<EntryType> {
    EntryType::parse(s).ok_or_else(|| anyhow::anyhow!("Expected debit or credit, got '{s}'"))
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => anyhow::bail!("Expected true or false, got '{s}'"),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn run(books: &Bookkeeper<Database>, company: &str, intent: Intent) -> Result<()> {
    let outcome = books.execute(company, intent)?;
    print::outcome(&outcome);
    Ok(())
}

// ── Companies and accounts ───────────────────────────────────

fn cli_init(books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    if books.init_company(company)? {
        println!("Created company {company}");
    } else {
        println!("Company {company} already exists");
    }
    Ok(())
}

fn cli_accounts(books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let aggregate = books.load(company)?;
    let mut accounts = aggregate.accounts.clone();
    accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
    print::accounts(&accounts);
    Ok(())
}

fn cli_add_account(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let usage = "add-account <number> <name> <type>";
    let number = required(args, 0, usage)?;
    let name = required(args, 1, usage)?;
    let kind = AccountType::parse(required(args, 2, usage)?);
    run(books, company, Intent::AddAccount(Account::new(number.into(), name.into(), kind)))
}

fn cli_update_account(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let number = required(args, 0, "update-account <number> [--name ..] [--type ..] [--active ..]")?;
    let patch = AccountPatch {
        account_name: flag(args, "--name").map(str::to_string),
        account_type: flag(args, "--type").map(AccountType::parse),
        is_less_accumulated: None,
        is_active: flag(args, "--active").map(parse_bool).transpose()?,
    };
    run(
        books,
        company,
        Intent::UpdateAccount {
            account_number: number.into(),
            patch,
        },
    )
}

fn cli_retype_accounts(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let kind = AccountType::parse(required(args, 0, "retype-accounts <type> <number>...")?);
    let numbers = ids(args).into_iter().skip(1).collect();
    run(
        books,
        company,
        Intent::BulkChangeAccountType {
            account_numbers: numbers,
            account_type: kind,
        },
    )
}

fn cli_bank_accounts(books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    print::bank_accounts(&books.load(company)?.bank_accounts);
    Ok(())
}

fn cli_add_bank(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let name = required(args, 0, "add-bank <name> [--id <id>] [--institution <name>]")?;
    let bank = BankAccount::new(
        flag(args, "--id").unwrap_or_default().to_string(),
        name.to_string(),
        flag(args, "--institution").unwrap_or_default().to_string(),
    );
    run(books, company, Intent::AddBankAccount(bank))
}

// ── Transactions ─────────────────────────────────────────────

fn cli_transactions(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let aggregate = books.load(company)?;
    let mut filter = TransactionFilter {
        month: flag(args, "--month").map(str::to_string),
        bank_account_id: flag(args, "--bank").map(str::to_string),
        ..TransactionFilter::active()
    };
    match flag(args, "--state").unwrap_or("all") {
        "all" => {}
        "uncategorized" => filter.category = CategoryState::Uncategorized,
        "categorized" => filter.category = CategoryState::Categorized,
        "excluded" => filter.excluded = Some(true),
        other => anyhow::bail!("Unknown state '{other}'"),
    }
    let mut rows: Vec<_> = store::filter(&aggregate.transactions, &filter).collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date));
    print::transactions(&rows, &aggregate);
    Ok(())
}

fn cli_add(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let usage = "add <YYYY-MM-DD> <description> <amount> [--category <number>] [--bank <id>]";
    let date = parse_date(required(args, 0, usage)?)?;
    let description = required(args, 1, usage)?;
    let amount = parse_amount(required(args, 2, usage)?)?;

    let mut new = NewTransaction::manual(date, description.to_string(), amount);
    if let Some(category) = flag(args, "--category") {
        new = new.in_category(category);
    }
    if let Some(bank) = flag(args, "--bank") {
        new = new.through_bank(bank);
    }
    run(books, company, Intent::AddTransaction(new))
}

fn cli_edit(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let id = required(args, 0, "edit <id> [--description ..] [--date ..] [--amount ..]")?;
    let edit = TransactionEdit {
        description: flag(args, "--description").map(str::to_string),
        date: flag(args, "--date").map(parse_date).transpose()?,
        amount: flag(args, "--amount").map(parse_amount).transpose()?,
    };
    run(
        books,
        company,
        Intent::EditTransaction {
            transaction_id: id.into(),
            edit,
        },
    )
}

fn cli_categorize(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let category = required(args, 0, "categorize <number> <id>...")?.to_string();
    let mut selected: Vec<String> = ids(args).into_iter().skip(1).collect();
    let intent = if selected.len() == 1 {
        Intent::Categorize {
            transaction_id: selected.remove(0),
            category,
        }
    } else {
        Intent::BulkCategorize {
            transaction_ids: selected,
            category,
        }
    };
    run(books, company, intent)
}

// ── Reconciliation ───────────────────────────────────────────

fn offset_spec(args: &[String], category: &str, entry_type: &str) -> Result<OffsetSpec> {
    let mut offset = OffsetSpec::new(
        category,
        parse_entry_type(entry_type)?,
        flag(args, "--description").unwrap_or_default(),
    );
    offset.amount = flag(args, "--amount").map(parse_amount).transpose()?;
    Ok(offset)
}

fn cli_reconcile(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let usage = "reconcile <number> <debit|credit> <id>...";
    let offset = offset_spec(args, required(args, 0, usage)?, required(args, 1, usage)?)?;
    run(
        books,
        company,
        Intent::BulkReconcile {
            transaction_ids: ids(args).into_iter().skip(2).collect(),
            offset,
        },
    )
}

fn cli_offset(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let usage = "offset <id> <number> <debit|credit>";
    let id = required(args, 0, usage)?;
    let offset = offset_spec(args, required(args, 1, usage)?, required(args, 2, usage)?)?;
    run(
        books,
        company,
        Intent::AddOrUpdateOffset {
            transaction_id: id.into(),
            offset,
        },
    )
}

pub(crate) fn parse_journal_pair(s: &str) -> Result<JournalPair> {
    match s.split(':').collect::<Vec<_>>().as_slice() {
        [debit, credit, amount] => Ok(JournalPair::new(debit, credit, parse_amount(amount)?)),
        _ => anyhow::bail!("Invalid journal line '{s}', expected <debit>:<credit>:<amount>"),
    }
}

fn cli_journal(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let usage = "journal <YYYY-MM-DD> <description> <debit>:<credit>:<amount>...";
    let date = parse_date(required(args, 0, usage)?)?;
    let description = required(args, 1, usage)?.to_string();
    let pairs = positionals(args)
        .into_iter()
        .skip(2)
        .map(parse_journal_pair)
        .collect::<Result<Vec<_>>>()?;
    run(
        books,
        company,
        Intent::JournalEntry {
            date,
            description,
            pairs,
        },
    )
}

// ── Rules ────────────────────────────────────────────────────

fn cli_rules(books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let aggregate = books.load(company)?;
    print::rules(&aggregate.category_rules);

    let proposals = crate::categorize::propose_categories(&aggregate.transactions, &aggregate.category_rules);
    if !proposals.is_empty() {
        println!();
        println!("{} uncategorized transaction(s) match a rule; run auto-categorize to apply", proposals.len());
    }

    let unmatched: Vec<String> = store::filter(
        &aggregate.transactions,
        &TransactionFilter {
            category: CategoryState::Uncategorized,
            ..TransactionFilter::active()
        },
    )
    .filter(|t| !proposals.iter().any(|p| p.transaction_id == t.id))
    .map(|t| crate::categorize::suggest_pattern(&t.description))
    .take(3)
    .collect();
    if !unmatched.is_empty() {
        println!(
            "Suggested keywords: {}",
            unmatched
                .iter()
                .map(|s| format!("add-rule <number> \"{s}\""))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

fn cli_add_rule(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let category = required(args, 0, "add-rule <number> <keyword>...")?.to_string();
    let patterns = ids(args).into_iter().skip(1).collect();
    run(books, company, Intent::AddRule { category, patterns })
}

fn cli_update_rule(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let id = required(args, 0, "update-rule <id> [--category <number>] [--keywords <a,b,...>]")?;
    run(
        books,
        company,
        Intent::UpdateRule {
            rule_id: id.into(),
            category: flag(args, "--category").map(str::to_string),
            patterns: flag(args, "--keywords").map(|k| k.split(',').map(str::to_string).collect()),
        },
    )
}

// ── Reports ──────────────────────────────────────────────────

fn cli_balance_sheet(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let as_of = flag(args, "--as-of").map(parse_date).transpose()?.unwrap_or_else(today);
    let aggregate = books.load(company)?;
    print::balance_sheet(&crate::reports::balance_sheet(&aggregate, as_of));
    Ok(())
}

fn cli_income(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let to = flag(args, "--to").map(parse_date).transpose()?.unwrap_or_else(today);
    let from = match flag(args, "--from") {
        Some(s) => parse_date(s)?,
        None => NaiveDate::from_ymd_opt(to.year(), 1, 1)
            .ok_or_else(|| anyhow::anyhow!("No start of year for {to}"))?,
    };
    if from > to {
        anyhow::bail!("--from {from} is after --to {to}");
    }
    let aggregate = books.load(company)?;
    print::income_statement(&crate::reports::income_statement(&aggregate, from, to));
    Ok(())
}

// ── Files ────────────────────────────────────────────────────

fn cli_import(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let file_path = required(args, 0, "import <file.csv> [--bank <id>]")?;
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let banks = books.load(company)?.bank_accounts;
    let bank_id = match flag(args, "--bank") {
        Some(id) => banks
            .iter()
            .find(|b| b.id == id || b.name.to_lowercase() == id.to_lowercase())
            .map(|b| b.id.clone())
            .ok_or_else(|| anyhow::anyhow!("Bank account '{id}' not found"))?,
        None => match banks.as_slice() {
            [] => anyhow::bail!("No bank accounts found. Add one first with add-bank <name>"),
            [only] => only.id.clone(),
            _ => {
                let names: Vec<String> = banks
                    .iter()
                    .map(|b| format!("  --bank {}  ({})", b.id, b.name))
                    .collect();
                anyhow::bail!("Multiple bank accounts found. Use --bank <id> to specify:\n{}", names.join("\n"));
            }
        },
    };

    let (headers, rows) = crate::import::CsvImporter::preview(path)?;
    let profile = crate::import::CsvProfile::from_headers(&headers);
    let rows = crate::import::CsvImporter::parse(&rows, &profile, &bank_id)?;
    println!("Parsed {} transactions", rows.len());

    let outcome = books.execute(company, Intent::ImportTransactions(rows))?;
    println!(
        "Imported {} new transactions ({} skipped)",
        outcome.changed.len(),
        outcome.skipped.len()
    );
    print::problems(&outcome);
    Ok(())
}

fn cli_export(args: &[String], books: &Bookkeeper<Database>, company: &str) -> Result<()> {
    let month = flag(args, "--month")
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m").to_string());

    let output_path = positionals(args)
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/bookkeep-{company}-{month}.csv")
        });

    let aggregate = books.load(company)?;
    let count = export_to_csv(Path::new(&output_path), &aggregate, Some(&month))?;
    if count == 0 {
        println!("No transactions for {month}");
    } else {
        println!("Exported {count} transactions to {output_path}");
    }
    Ok(())
}

fn cli_config(args: &[String], settings: &Settings) -> Result<()> {
    let pos = positionals(args);
    let (key, value) = match pos.as_slice() {
        [] => {
            println!("{}", serde_json::to_string_pretty(settings)?);
            return Ok(());
        }
        [key, value] => (*key, *value),
        _ => anyhow::bail!("Usage: bookkeep config [<key> <value>]"),
    };

    let mut updated = settings.clone();
    match key {
        "data_dir" => updated.data_dir = shellexpand(value).into(),
        "company_id" => updated.company_id = value.to_string(),
        "max_write_attempts" => {
            updated.max_write_attempts = value
                .parse()
                .with_context(|| format!("Invalid number '{value}'"))?;
        }
        "log_level" => updated.log_level = value.to_string(),
        other => anyhow::bail!("Unknown setting '{other}'"),
    }
    let path = updated.save()?;
    println!("Saved {key} to {}", path.display());
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
