//! MySQL/MariaDB adapter, backed by mysql_async.
//!
//! MySQL autocommits most DDL regardless of transactions, but the ledger
//! mutation still runs inside one so a failed batch never records its
//! version. Server errors report a 1-based line number in the message text
//! rather than a byte offset.

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, TxOpts};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{MigrateError, Result};
use crate::file::{Direction, MigrationFile, Version, Versions};
use crate::ledger;
use crate::pipe::PipeSender;
use crate::statement::{statements, transaction_disabled};

use super::{DecodedError, Driver};

/// Matches the trailing position clause of a MySQL syntax error message.
static LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"at line ([0-9]+)$").unwrap());

/// MySQL backend driver. One connection, owned exclusively.
#[derive(Default)]
pub struct MysqlDriver {
    conn: Option<Conn>,
}

impl MysqlDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn conn(&mut self) -> Result<&mut Conn> {
        self.conn.as_mut().ok_or(MigrateError::NotInitialized)
    }

    /// Legacy ledgers created before the 64-bit version change carry an
    /// `int` column that must be widened in place.
    fn needs_widen(data_type: Option<&str>) -> bool {
        data_type == Some("int")
    }

    fn widen_version_column_sql() -> String {
        format!("ALTER TABLE {} MODIFY version bigint", ledger::TABLE_NAME)
    }

    /// Create the ledger table, or widen a legacy `int` version column.
    async fn ensure_version_table(conn: &mut Conn) -> Result<()> {
        conn.query_drop(format!(
            "CREATE TABLE IF NOT EXISTS {} (version bigint not null primary key)",
            ledger::TABLE_NAME
        ))
        .await?;

        let data_type: Option<String> = conn
            .exec_first(
                "SELECT data_type FROM information_schema.columns \
                 WHERE table_name = ? AND column_name = 'version'",
                (ledger::TABLE_NAME,),
            )
            .await?;

        if Self::needs_widen(data_type.as_deref()) {
            conn.query_drop(Self::widen_version_column_sql()).await?;
        }
        Ok(())
    }

    fn ledger_sql(direction: Direction) -> String {
        match direction {
            Direction::Up => ledger::insert_version_sql("?"),
            Direction::Down => ledger::delete_version_sql("?"),
        }
    }

    async fn apply(&mut self, file: &MigrationFile) -> std::result::Result<(), Vec<MigrateError>> {
        let content = file.content().map_err(|e| vec![e])?.to_string();
        let version = file.version;
        let direction = file.direction;
        let conn = self.conn().map_err(|e| vec![e])?;

        if transaction_disabled(&content) {
            for stmt in statements(&content) {
                debug!(statement = stmt.text, "executing (no transaction)");
                conn.query_drop(stmt.text)
                    .await
                    .map_err(|e| vec![decode_error(&e).into_diagnostic(&stmt)])?;
            }
            conn.exec_drop(Self::ledger_sql(direction), (version,))
                .await
                .map_err(|e| vec![e.into()])?;
            return Ok(());
        }

        let mut tx = conn
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| vec![e.into()])?;

        if let Err(e) = tx.exec_drop(Self::ledger_sql(direction), (version,)).await {
            let mut errs = vec![MigrateError::from(e)];
            if let Err(rollback) = tx.rollback().await {
                errs.push(rollback.into());
            }
            return Err(errs);
        }

        for stmt in statements(&content) {
            debug!(statement = stmt.text, "executing");
            if let Err(e) = tx.query_drop(stmt.text).await {
                let mut errs = vec![decode_error(&e).into_diagnostic(&stmt)];
                if let Err(rollback) = tx.rollback().await {
                    errs.push(rollback.into());
                }
                return Err(errs);
            }
        }

        tx.commit().await.map_err(|e| vec![e.into()])?;
        Ok(())
    }
}

#[async_trait]
impl Driver for MysqlDriver {
    async fn initialize(&mut self, url: &str) -> Result<()> {
        let opts = Opts::from_url(url).map_err(|e| MigrateError::InvalidUrl(e.to_string()))?;
        let mut conn = Conn::new(opts).await?;
        Self::ensure_version_table(&mut conn).await?;
        info!("connected to mysql database");
        self.conn = Some(conn);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await?;
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

        if let Err(errors) = self.apply(&file).await {
            for e in errors {
                pipe.error(e).await;
            }
        }
    }

    async fn version(&mut self) -> Result<Version> {
        let conn = self.conn()?;
        let version: Option<i64> = conn.query_first(ledger::max_version_sql()).await?;
        Ok(version.unwrap_or(0))
    }

    async fn versions(&mut self) -> Result<Versions> {
        let conn = self.conn()?;
        let versions: Vec<i64> = conn.query(ledger::all_versions_sql()).await?;
        Ok(versions)
    }
}

/// Decode a mysql_async error into the common shape. Syntax errors end with
/// `at line N`, which is the only position MySQL reports.
fn decode_error(err: &mysql_async::Error) -> DecodedError {
    match err {
        mysql_async::Error::Server(server) => {
            let line = LINE_RE
                .captures(&server.message)
                .and_then(|caps| caps[1].parse::<usize>().ok());
            DecodedError {
                message: format!(
                    "ERROR {} ({}): {}",
                    server.code, server.state, server.message
                ),
                byte_offset: None,
                line,
            }
        }
        other => DecodedError::message_only(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_extracts_line_number() {
        let err = mysql_async::Error::Server(mysql_async::ServerError {
            code: 1064,
            state: "42000".into(),
            message: "You have an error in your SQL syntax; check the manual \
                      that corresponds to your MySQL server version for the \
                      right syntax to use near 'WILL CAUSE AN ERROR' at line 3"
                .into(),
        });
        let decoded = decode_error(&err);
        assert_eq!(decoded.line, Some(3));
        assert!(decoded.message.starts_with("ERROR 1064 (42000):"));
    }

    #[test]
    fn widen_only_for_legacy_int_column() {
        assert!(MysqlDriver::needs_widen(Some("int")));
        assert!(!MysqlDriver::needs_widen(Some("bigint")));
        assert!(!MysqlDriver::needs_widen(None));
    }

    #[test]
    fn widen_modifies_version_column() {
        assert_eq!(
            MysqlDriver::widen_version_column_sql(),
            "ALTER TABLE schema_migrations MODIFY version bigint"
        );
    }

    #[test]
    fn decode_without_position_clause() {
        let err = mysql_async::Error::Server(mysql_async::ServerError {
            code: 1050,
            state: "42S01".into(),
            message: "Table 'yolo' already exists".into(),
        });
        let decoded = decode_error(&err);
        assert_eq!(decoded.line, None);
        assert!(decoded.message.contains("already exists"));
    }
}
