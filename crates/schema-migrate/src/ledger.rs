//! The version ledger protocol shared by every SQL adapter.
//!
//! Applied versions live in a single well-known table with one 64-bit
//! `version` column as primary key, so duplicate application fails
//! structurally on insert. Adapters build their SQL from the templates here
//! so the ledger behaves identically across engines; only the placeholder
//! syntax and the idempotent create/widen DDL differ per dialect and stay in
//! the adapter.

/// Name of the ledger table. Fixed; only override if a deployment needs
/// multiple concurrent ledgers in one database.
pub const TABLE_NAME: &str = "schema_migrations";

/// INSERT recording an applied version. `placeholder` is the dialect's
/// parameter marker (`$1`, `?`, `@P1`).
pub fn insert_version_sql(placeholder: &str) -> String {
    format!("INSERT INTO {TABLE_NAME} (version) VALUES ({placeholder})")
}

/// DELETE removing a reverted version.
pub fn delete_version_sql(placeholder: &str) -> String {
    format!("DELETE FROM {TABLE_NAME} WHERE version = {placeholder}")
}

/// SELECT for the maximum applied version.
pub fn max_version_sql() -> String {
    format!("SELECT version FROM {TABLE_NAME} ORDER BY version DESC LIMIT 1")
}

/// SELECT for all applied versions, descending.
pub fn all_versions_sql() -> String {
    format!("SELECT version FROM {TABLE_NAME} ORDER BY version DESC")
}
