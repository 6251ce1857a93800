mod export;
#[cfg(test)]
mod memory;
mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::models::{AggregateUpdate, CompanyAggregate, RecoverableItem, Versioned};

pub(crate) use export::{export_to_csv, write_transactions_csv};
#[cfg(test)]
pub(crate) use memory::MemoryStore;

/// Where company aggregates and their recoverable items live.
///
/// Saves are optimistic: a write names the version it was computed from and
/// fails with [`StoreError::ConcurrencyConflict`] if anyone wrote since.
pub(crate) trait PersistenceAdapter: Send + Sync {
    /// Create a company with a starting aggregate. False if it already exists.
    fn init_company(&self, company_id: &str, aggregate: &CompanyAggregate) -> Result<bool, StoreError>;

    fn load_company_aggregate(&self, company_id: &str) -> Result<Versioned<CompanyAggregate>, StoreError>;

    /// Overwrite the arrays present in `update`. Returns the new version.
    fn save_company_aggregate(
        &self,
        company_id: &str,
        update: &AggregateUpdate,
        expected_version: u64,
    ) -> Result<u64, StoreError>;

    /// Keep a removed item. Storing the same item twice keeps the latest copy.
    fn move_to_recoverable(&self, company_id: &str, item: &RecoverableItem) -> Result<(), StoreError>;

    /// Take an item out of the recoverable store.
    fn restore_from_recoverable(
        &self,
        company_id: &str,
        item_id: &str,
    ) -> Result<Option<RecoverableItem>, StoreError>;

    /// Newest first.
    fn list_recoverable(&self, company_id: &str) -> Result<Vec<RecoverableItem>, StoreError>;
}

pub(crate) struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let conn = self
            .conn
            .get_mut()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;

        let has_version_table: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            conn.execute_batch(schema::SCHEMA_V1)?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            log::info!("migrated schema from version {current} to {}", schema::CURRENT_VERSION);
            conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".into()))
    }

    pub(crate) fn list_companies(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM companies ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }
}

fn company_version(conn: &Connection, company_id: &str) -> Result<u64, StoreError> {
    let version: Option<i64> = conn
        .query_row(
            "SELECT version FROM companies WHERE id = ?1",
            params![company_id],
            |row| row.get(0),
        )
        .optional()?;
    version
        .map(|v| v.max(0) as u64)
        .ok_or_else(|| StoreError::CompanyNotFound(company_id.to_string()))
}

fn write_document<T: Serialize>(
    conn: &Connection,
    company_id: &str,
    field: &str,
    value: &T,
) -> Result<(), StoreError> {
    let body = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO company_documents (company_id, field, body) VALUES (?1, ?2, ?3)
         ON CONFLICT(company_id, field) DO UPDATE SET body = excluded.body",
        params![company_id, field, body],
    )?;
    Ok(())
}

fn read_document<T: DeserializeOwned + Default>(
    conn: &Connection,
    company_id: &str,
    field: &str,
) -> Result<T, StoreError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM company_documents WHERE company_id = ?1 AND field = ?2",
            params![company_id, field],
            |row| row.get(0),
        )
        .optional()?;
    match body {
        Some(body) => Ok(serde_json::from_str(&body)?),
        None => Ok(T::default()),
    }
}

fn write_update(conn: &Connection, company_id: &str, update: &AggregateUpdate) -> Result<(), StoreError> {
    if let Some(transactions) = &update.transactions {
        write_document(conn, company_id, schema::FIELD_TRANSACTIONS, transactions)?;
    }
    if let Some(accounts) = &update.accounts {
        write_document(conn, company_id, schema::FIELD_ACCOUNTS, accounts)?;
    }
    if let Some(rules) = &update.category_rules {
        write_document(conn, company_id, schema::FIELD_CATEGORY_RULES, rules)?;
    }
    if let Some(banks) = &update.bank_accounts {
        write_document(conn, company_id, schema::FIELD_BANK_ACCOUNTS, banks)?;
    }
    Ok(())
}

impl PersistenceAdapter for Database {
    fn init_company(&self, company_id: &str, aggregate: &CompanyAggregate) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO companies (id, version, created_at) VALUES (?1, 0, ?2)",
            params![company_id, chrono::Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            return Ok(false);
        }
        write_update(&tx, company_id, &AggregateUpdate::full(aggregate))?;
        tx.commit()?;
        Ok(true)
    }

    fn load_company_aggregate(&self, company_id: &str) -> Result<Versioned<CompanyAggregate>, StoreError> {
        let conn = self.conn()?;
        let version = company_version(&conn, company_id)?;
        let value = CompanyAggregate {
            transactions: read_document(&conn, company_id, schema::FIELD_TRANSACTIONS)?,
            accounts: read_document(&conn, company_id, schema::FIELD_ACCOUNTS)?,
            category_rules: read_document(&conn, company_id, schema::FIELD_CATEGORY_RULES)?,
            bank_accounts: read_document(&conn, company_id, schema::FIELD_BANK_ACCOUNTS)?,
        };
        Ok(Versioned { value, version })
    }

    fn save_company_aggregate(
        &self,
        company_id: &str,
        update: &AggregateUpdate,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let found = company_version(&tx, company_id)?;
        if found != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                expected: expected_version,
                found,
            });
        }
        write_update(&tx, company_id, update)?;
        let next = expected_version + 1;
        tx.execute(
            "UPDATE companies SET version = ?1 WHERE id = ?2 AND version = ?3",
            params![next as i64, company_id, expected_version as i64],
        )?;
        tx.commit()?;
        Ok(next)
    }

    fn move_to_recoverable(&self, company_id: &str, item: &RecoverableItem) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let body = serde_json::to_string(item)?;
        conn.execute(
            "INSERT INTO recoverable (company_id, item_id, item_type, deleted_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(company_id, item_id) DO UPDATE SET
                item_type = excluded.item_type,
                deleted_at = excluded.deleted_at,
                body = excluded.body",
            params![
                company_id,
                item.id(),
                item.item_type().as_str(),
                item.deleted_at.to_rfc3339(),
                body
            ],
        )?;
        Ok(())
    }

    fn restore_from_recoverable(
        &self,
        company_id: &str,
        item_id: &str,
    ) -> Result<Option<RecoverableItem>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM recoverable WHERE company_id = ?1 AND item_id = ?2",
                params![company_id, item_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(body) = body else {
            return Ok(None);
        };
        let item: RecoverableItem = serde_json::from_str(&body)?;
        tx.execute(
            "DELETE FROM recoverable WHERE company_id = ?1 AND item_id = ?2",
            params![company_id, item_id],
        )?;
        tx.commit()?;
        Ok(Some(item))
    }

    fn list_recoverable(&self, company_id: &str) -> Result<Vec<RecoverableItem>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT body FROM recoverable WHERE company_id = ?1 ORDER BY deleted_at DESC, item_id",
        )?;
        let rows = stmt.query_map(params![company_id], |row| row.get::<_, String>(0))?;
        let mut items = Vec::new();
        for body in rows {
            items.push(serde_json::from_str(&body?)?);
        }
        Ok(items)
    }
}
