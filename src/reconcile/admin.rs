use crate::error::{InvalidOperation, Rejection};
use crate::ledger::{self, AccountPatch};
use crate::models::{is_uncategorized, Account, AccountType, BankAccount, CategoryRule, Removed};

use super::{new_id, Session};

impl Session {
    pub(super) fn add_account(&mut self, account: Account) -> Result<(), Rejection> {
        let number = account.account_number.trim().to_string();
        ledger::add_account(&mut self.aggregate.accounts, account)?;
        self.mark_changed(&number);
        Ok(())
    }

    pub(super) fn update_account(&mut self, number: &str, patch: &AccountPatch) -> Result<(), Rejection> {
        ledger::update_account(&mut self.aggregate.accounts, number, patch)?;
        self.mark_changed(number.trim());
        Ok(())
    }

    pub(super) fn bulk_change_account_type(
        &mut self,
        numbers: &[String],
        account_type: AccountType,
    ) -> Result<(), Rejection> {
        super::require_selection(numbers)?;
        let missing = ledger::bulk_change_type(&mut self.aggregate.accounts, numbers, account_type)?;
        for number in numbers {
            let number = number.trim();
            if missing.iter().any(|m| m == number) {
                self.skip(number, Rejection::AccountNotFound(number.to_string()));
            } else {
                self.mark_changed(number);
            }
        }
        Ok(())
    }

    /// Delete an account. Its transactions fall back to Uncategorized first.
    pub(super) fn delete_account(&mut self, number: &str) -> Result<(), Rejection> {
        let number = number.trim();
        let moved: Vec<String> = self
            .aggregate
            .transactions
            .iter()
            .filter(|t| t.category.trim() == number)
            .map(|t| t.id.clone())
            .collect();
        let removed = ledger::delete_account(
            &mut self.aggregate.accounts,
            &mut self.aggregate.transactions,
            number,
            self.now,
        )?;
        for id in &moved {
            self.mark_changed(id);
        }
        self.removed.push(Removed::Account(removed));
        Ok(())
    }

    pub(super) fn add_bank_account(&mut self, mut bank: BankAccount) -> Result<(), Rejection> {
        bank.id = bank.id.trim().to_string();
        if bank.id.is_empty() {
            bank.id = new_id();
        }
        if self.aggregate.bank_account(&bank.id).is_some() {
            return Err(InvalidOperation::DuplicateBankAccount(bank.id).into());
        }
        let id = bank.id.clone();
        self.aggregate.bank_accounts.push(bank);
        self.mark_changed(&id);
        Ok(())
    }

    fn validate_rule(&self, category: &str, patterns: &[String]) -> Result<(), Rejection> {
        if is_uncategorized(category) {
            return Err(InvalidOperation::MissingRuleCategory.into());
        }
        if self.aggregate.account(category).is_none() {
            return Err(Rejection::AccountNotFound(category.trim().to_string()));
        }
        if patterns.iter().all(|p| p.trim().is_empty()) {
            return Err(InvalidOperation::EmptyRule.into());
        }
        Ok(())
    }

    pub(super) fn add_rule(&mut self, category: &str, patterns: Vec<String>) -> Result<(), Rejection> {
        self.validate_rule(category, &patterns)?;
        let rule = CategoryRule::new(new_id(), category.trim().to_string(), patterns);
        let id = rule.id.clone();
        self.aggregate.category_rules.push(rule);
        self.mark_changed(&id);
        Ok(())
    }

    pub(super) fn update_rule(
        &mut self,
        rule_id: &str,
        category: Option<String>,
        patterns: Option<Vec<String>>,
    ) -> Result<(), Rejection> {
        let current = self
            .aggregate
            .category_rules
            .iter()
            .find(|r| r.id == rule_id)
            .cloned()
            .ok_or_else(|| Rejection::RuleNotFound(rule_id.to_string()))?;
        let category = category.unwrap_or(current.category);
        let patterns = patterns.unwrap_or(current.patterns);
        self.validate_rule(&category, &patterns)?;

        let updated = CategoryRule::new(current.id, category.trim().to_string(), patterns);
        if let Some(slot) = self.aggregate.category_rules.iter_mut().find(|r| r.id == rule_id) {
            *slot = updated;
        }
        self.mark_changed(rule_id);
        Ok(())
    }

    /// Deleting a rule leaves already categorized transactions alone.
    pub(super) fn delete_rule(&mut self, rule_id: &str) -> Result<(), Rejection> {
        let index = self
            .aggregate
            .category_rules
            .iter()
            .position(|r| r.id == rule_id)
            .ok_or_else(|| Rejection::RuleNotFound(rule_id.to_string()))?;
        let rule = self.aggregate.category_rules.remove(index);
        self.removed.push(Removed::CategoryRule(rule));
        Ok(())
    }
}
