use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::models::{AggregateUpdate, CompanyAggregate, RecoverableItem, Versioned};

use super::PersistenceAdapter;

#[derive(Default)]
struct Company {
    aggregate: CompanyAggregate,
    version: u64,
    recoverable: Vec<RecoverableItem>,
}

/// In-process adapter with the same versioning rules as [`super::Database`].
#[derive(Default)]
pub(crate) struct MemoryStore {
    companies: Mutex<HashMap<String, Company>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn companies(&self) -> Result<MutexGuard<'_, HashMap<String, Company>>, StoreError> {
        self.companies
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

fn not_found(company_id: &str) -> StoreError {
    StoreError::CompanyNotFound(company_id.to_string())
}

impl PersistenceAdapter for MemoryStore {
    fn init_company(&self, company_id: &str, aggregate: &CompanyAggregate) -> Result<bool, StoreError> {
        let mut companies = self.companies()?;
        if companies.contains_key(company_id) {
            return Ok(false);
        }
        companies.insert(
            company_id.to_string(),
            Company {
                aggregate: aggregate.clone(),
                ..Company::default()
            },
        );
        Ok(true)
    }

    fn load_company_aggregate(&self, company_id: &str) -> Result<Versioned<CompanyAggregate>, StoreError> {
        let companies = self.companies()?;
        let company = companies.get(company_id).ok_or_else(|| not_found(company_id))?;
        Ok(Versioned {
            value: company.aggregate.clone(),
            version: company.version,
        })
    }

    fn save_company_aggregate(
        &self,
        company_id: &str,
        update: &AggregateUpdate,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut companies = self.companies()?;
        let company = companies.get_mut(company_id).ok_or_else(|| not_found(company_id))?;
        if company.version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                expected: expected_version,
                found: company.version,
            });
        }
        update.clone().apply_to(&mut company.aggregate);
        company.version += 1;
        Ok(company.version)
    }

    fn move_to_recoverable(&self, company_id: &str, item: &RecoverableItem) -> Result<(), StoreError> {
        let mut companies = self.companies()?;
        let company = companies.get_mut(company_id).ok_or_else(|| not_found(company_id))?;
        company.recoverable.retain(|r| r.id() != item.id());
        company.recoverable.push(item.clone());
        Ok(())
    }

    fn restore_from_recoverable(
        &self,
        company_id: &str,
        item_id: &str,
    ) -> Result<Option<RecoverableItem>, StoreError> {
        let mut companies = self.companies()?;
        let company = companies.get_mut(company_id).ok_or_else(|| not_found(company_id))?;
        let index = company.recoverable.iter().position(|r| r.id() == item_id);
        Ok(index.map(|i| company.recoverable.remove(i)))
    }

    fn list_recoverable(&self, company_id: &str) -> Result<Vec<RecoverableItem>, StoreError> {
        let companies = self.companies()?;
        let company = companies.get(company_id).ok_or_else(|| not_found(company_id))?;
        let mut items = company.recoverable.clone();
        items.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(items)
    }
}
