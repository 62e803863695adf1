//! SQLite adapter, backed by rusqlite.
//!
//! SQLite has transactional DDL, so the default path wraps the ledger
//! mutation and the statement batch in one transaction. The client is
//! synchronous; migration batches are short, so calls run inline on the
//! driver's task.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::{MigrateError, Result};
use crate::file::{Direction, MigrationFile, Version, Versions};
use crate::ledger;
use crate::pipe::PipeSender;
use crate::statement::{statements, transaction_disabled};

use super::{DecodedError, Driver};

/// SQLite backend driver. One connection, owned exclusively.
#[derive(Default)]
pub struct SqliteDriver {
    conn: Option<Connection>,
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn conn(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(MigrateError::NotInitialized)
    }

    fn ensure_version_table(conn: &Connection) -> Result<()> {
        // SQLite's INTEGER storage is already 64-bit, so no widening path.
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (version bigint not null primary key)",
            ledger::TABLE_NAME
        ))?;
        Ok(())
    }

    fn ledger_sql(direction: Direction) -> String {
        match direction {
            Direction::Up => ledger::insert_version_sql("?"),
            Direction::Down => ledger::delete_version_sql("?"),
        }
    }

    /// Run the ledger mutation and statement batch. On failure, returns every
    /// error to report in order (the cause, then a rollback failure if any).
    fn apply(&mut self, file: &MigrationFile) -> std::result::Result<(), Vec<MigrateError>> {
        let content = file.content().map_err(|e| vec![e])?.to_string();
        let version = file.version;
        let direction = file.direction;
        let conn = self.conn().map_err(|e| vec![e])?;

        if transaction_disabled(&content) {
            // Autocommit path: the ledger mutation runs only after every
            // statement succeeded, so a failed file never records its
            // version. Partial schema changes can remain; that is the
            // documented cost of the directive.
            for stmt in statements(&content) {
                debug!(statement = stmt.text, "executing (no transaction)");
                conn.execute_batch(stmt.text)
                    .map_err(|e| vec![decode_error(&e).into_diagnostic(&stmt)])?;
            }
            conn.execute(&Self::ledger_sql(direction), params![version])
                .map_err(|e| vec![e.into()])?;
            return Ok(());
        }

        let tx = conn.transaction().map_err(|e| vec![e.into()])?;

        if let Err(e) = tx.execute(&Self::ledger_sql(direction), params![version]) {
            let mut errs = vec![MigrateError::from(e)];
            if let Err(rollback) = tx.rollback() {
                errs.push(rollback.into());
            }
            return Err(errs);
        }

        for stmt in statements(&content) {
            debug!(statement = stmt.text, "executing");
            if let Err(e) = tx.execute_batch(stmt.text) {
                let mut errs = vec![decode_error(&e).into_diagnostic(&stmt)];
                if let Err(rollback) = tx.rollback() {
                    errs.push(rollback.into());
                }
                return Err(errs);
            }
        }

        tx.commit().map_err(|e| vec![e.into()])?;
        Ok(())
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    async fn initialize(&mut self, url: &str) -> Result<()> {
        let path = url
            .split_once("://")
            .map(|(_, rest)| rest)
            .ok_or_else(|| MigrateError::InvalidUrl(format!("missing scheme in '{url}'")))?;

        let conn = Connection::open(path)?;
        Self::ensure_version_table(&conn)?;
        info!(path, "connected to sqlite database");
        self.conn = Some(conn);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| MigrateError::from(e))?;
        }
        Ok(())
    }

    fn filename_extension(&self) -> &'static str {
        "sql"
    }

    async fn migrate(&mut self, mut file: MigrationFile, pipe: PipeSender) {
        pipe.started(file.clone()).await;

        if let Err(e) = file.read_content() {
            pipe.error(e).await;
            return;
        }

        if let Err(errors) = self.apply(&file) {
            for e in errors {
                pipe.error(e).await;
            }
        }
    }

    async fn version(&mut self) -> Result<Version> {
        let conn = self.conn()?;
        match conn.query_row(&ledger::max_version_sql(), [], |row| row.get::<_, i64>(0)) {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn versions(&mut self) -> Result<Versions> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&ledger::all_versions_sql())?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let versions = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(versions)
    }
}

/// Decode a rusqlite error into the common shape. Syntax errors carry a byte
/// offset into the failing statement.
fn decode_error(err: &rusqlite::Error) -> DecodedError {
    match err {
        rusqlite::Error::SqlInputError { msg, offset, .. } => DecodedError {
            message: format!("SQL input error: {msg}"),
            byte_offset: (*offset >= 0).then_some(*offset as usize),
            line: None,
        },
        rusqlite::Error::SqliteFailure(_, Some(msg)) => DecodedError::message_only(msg.clone()),
        other => DecodedError::message_only(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_passes_plain_failures_through() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        let decoded = decode_error(&err);
        assert!(decoded.byte_offset.is_none());
        assert!(decoded.line.is_none());
    }

    #[test]
    fn decode_syntax_error_carries_offset() {
        // Provoke a real SqlInputError from an in-memory connection.
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .execute_batch("CREATE TABLE error (id THIS WILL CAUSE AN ERROR)")
            .unwrap_err();
        let decoded = decode_error(&err);
        assert!(decoded.message.contains("syntax error"), "{}", decoded.message);
        assert!(decoded.byte_offset.is_some());
    }
}
