//! The Bookkeeper: one writer per company over a persistence adapter.
//!
//! Every intent runs as load, compute, save. Saves are optimistic, so a
//! cycle that loses a race against another writer is retried from a fresh
//! load, up to the configured number of attempts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;

use crate::db::PersistenceAdapter;
use crate::duplicates::{find_duplicates, DuplicateGroup};
use crate::error::{Rejection, StoreError};
use crate::models::{AggregateUpdate, CompanyAggregate, RecoverableItem, Removed};
use crate::reconcile::{self, Intent, Outcome};

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("company data kept changing while saving; gave up after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error(transparent)]
    Infrastructure(#[from] StoreError),
}

pub(crate) struct Bookkeeper<A> {
    store: A,
    max_attempts: u32,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<A: PersistenceAdapter> Bookkeeper<A> {
    pub(crate) fn new(store: A, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn store(&self) -> &A {
        &self.store
    }

    fn company_lock(&self, company_id: &str) -> Result<Arc<Mutex<()>>, Error> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| StoreError::Unavailable("company lock table poisoned".into()))?;
        Ok(Arc::clone(locks.entry(company_id.to_string()).or_default()))
    }

    /// Create the company with the default chart of accounts if it is new.
    pub(crate) fn init_company(&self, company_id: &str) -> Result<bool, Error> {
        let created = self
            .store
            .init_company(company_id, &CompanyAggregate::with_default_chart())?;
        if created {
            log::info!("created company {company_id}");
        }
        Ok(created)
    }

    /// Current books, with the Uncategorized account guaranteed present.
    pub(crate) fn load(&self, company_id: &str) -> Result<CompanyAggregate, Error> {
        let mut aggregate = self.store.load_company_aggregate(company_id)?.value;
        if aggregate.ensure_uncategorized() {
            log::warn!("company {company_id}: repaired the Uncategorized account");
        }
        Ok(aggregate)
    }

    pub(crate) fn execute(&self, company_id: &str, intent: Intent) -> Result<Outcome, Error> {
        let lock = self.company_lock(company_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| StoreError::Unavailable(format!("lock for {company_id} poisoned")))?;
        self.commit(company_id, &intent)
    }

    /// Bring a removed item back. A journal entry leg brings its partner
    /// with it. If the restore cannot be saved the items stay recoverable.
    pub(crate) fn restore_deleted(&self, company_id: &str, item_id: &str) -> Result<Outcome, Error> {
        let lock = self.company_lock(company_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| StoreError::Unavailable(format!("lock for {company_id} poisoned")))?;

        let first = self
            .store
            .restore_from_recoverable(company_id, item_id)?
            .ok_or_else(|| Rejection::RecoverableNotFound(item_id.to_string()))?;
        let entry = match &first.removed {
            Removed::Transaction(txn) => txn.journal_entry_id.clone(),
            _ => None,
        };
        let mut items = vec![first];
        if let Some(entry) = entry {
            for other in self.store.list_recoverable(company_id)? {
                let same_entry = matches!(
                    &other.removed,
                    Removed::Transaction(t) if t.journal_entry_id.as_deref() == Some(entry.as_str())
                );
                if same_entry {
                    if let Some(partner) = self.store.restore_from_recoverable(company_id, other.id())? {
                        items.push(partner);
                    }
                }
            }
        }

        let intent = Intent::RestoreDeleted {
            items: items.iter().map(|i| i.removed.clone()).collect(),
        };
        let result = self.commit(company_id, &intent);
        if result.is_err() {
            for item in &items {
                if let Err(e) = self.store.move_to_recoverable(company_id, item) {
                    log::error!("company {company_id}: could not keep {} recoverable: {e}", item.id());
                }
            }
        }
        result
    }

    pub(crate) fn list_recoverable(&self, company_id: &str) -> Result<Vec<RecoverableItem>, Error> {
        Ok(self.store.list_recoverable(company_id)?)
    }

    pub(crate) fn duplicates(&self, company_id: &str) -> Result<Vec<DuplicateGroup>, Error> {
        Ok(find_duplicates(&self.load(company_id)?.transactions))
    }

    /// Load, apply and save, retrying on lost races. Callers hold the
    /// company lock.
    fn commit(&self, company_id: &str, intent: &Intent) -> Result<Outcome, Error> {
        for attempt in 1..=self.max_attempts {
            let loaded = self.store.load_company_aggregate(company_id)?;
            let mut current = loaded.value.clone();
            if current.ensure_uncategorized() {
                log::warn!("company {company_id}: repaired the Uncategorized account");
            }

            let now = Utc::now();
            let outcome = reconcile::apply(&current, intent.clone(), now)?;
            let update = AggregateUpdate::diff(&loaded.value, &outcome.aggregate);

            let kept: Vec<RecoverableItem> = outcome
                .removed
                .iter()
                .map(|r| RecoverableItem::new(r.clone(), now))
                .collect();
            for item in &kept {
                self.store.move_to_recoverable(company_id, item)?;
            }
            if update.is_empty() {
                return Ok(outcome);
            }

            match self.store.save_company_aggregate(company_id, &update, loaded.version) {
                Ok(version) => {
                    log::info!(
                        "company {company_id}: {} saved as version {version}",
                        intent.name()
                    );
                    return Ok(outcome);
                }
                Err(e) => {
                    self.forget(company_id, &kept);
                    if !e.is_conflict() {
                        return Err(e.into());
                    }
                    log::warn!(
                        "company {company_id}: {} lost a write race (attempt {attempt} of {}): {e}",
                        intent.name(),
                        self.max_attempts
                    );
                }
            }
        }
        Err(Error::Conflict {
            attempts: self.max_attempts,
        })
    }

    /// Drop recoverable copies written for a save that did not land.
    fn forget(&self, company_id: &str, kept: &[RecoverableItem]) {
        for item in kept {
            if let Err(e) = self.store.restore_from_recoverable(company_id, item.id()) {
                log::error!("company {company_id}: could not drop recoverable {}: {e}", item.id());
            }
        }
    }
}
