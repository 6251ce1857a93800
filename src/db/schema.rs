pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS companies (
    id          TEXT PRIMARY KEY,
    version     INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS company_documents (
    company_id  TEXT NOT NULL REFERENCES companies(id),
    field       TEXT NOT NULL,
    body        TEXT NOT NULL,
    PRIMARY KEY (company_id, field)
);

CREATE TABLE IF NOT EXISTS recoverable (
    company_id  TEXT NOT NULL REFERENCES companies(id),
    item_id     TEXT NOT NULL,
    item_type   TEXT NOT NULL,
    deleted_at  TEXT NOT NULL,
    body        TEXT NOT NULL,
    PRIMARY KEY (company_id, item_id)
);

CREATE INDEX IF NOT EXISTS idx_recoverable_deleted ON recoverable(company_id, deleted_at);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];

/// Aggregate fields, each stored as one JSON document per company.
pub(crate) const FIELD_TRANSACTIONS: &str = "transactions";
pub(crate) const FIELD_ACCOUNTS: &str = "accounts";
pub(crate) const FIELD_CATEGORY_RULES: &str = "categoryRules";
pub(crate) const FIELD_BANK_ACCOUNTS: &str = "bankAccounts";
