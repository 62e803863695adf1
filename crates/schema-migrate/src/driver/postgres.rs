//! PostgreSQL adapter, backed by tokio-postgres.
//!
//! PostgreSQL has transactional DDL and reports statement errors with a
//! 1-based byte position, which maps cleanly onto the locator machinery.

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::error::ErrorPosition;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, info, warn};

use crate::error::{MigrateError, Result};
use crate::file::{Direction, MigrationFile, Version, Versions};
use crate::ledger;
use crate::pipe::PipeSender;
use crate::statement::{statements, transaction_disabled};

use super::{DecodedError, Driver};

/// PostgreSQL backend driver. One client plus its background connection task.
#[derive(Default)]
pub struct PostgresDriver {
    client: Option<Client>,
    connection_task: Option<JoinHandle<()>>,
}

impl PostgresDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&mut self) -> Result<&mut Client> {
        self.client.as_mut().ok_or(MigrateError::NotInitialized)
    }

    /// Legacy ledgers created before the 64-bit version change carry an
    /// `integer` column that must be widened in place.
    fn needs_widen(data_type: &str) -> bool {
        data_type != "bigint"
    }

    fn widen_version_column_sql() -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN version TYPE bigint USING version::bigint",
            ledger::TABLE_NAME
        )
    }

    /// Create the ledger table, or widen a legacy non-bigint version column.
    /// Avoids DDL entirely when the table already has the right shape.
    async fn ensure_version_table(client: &Client) -> Result<()> {
        let row = client
            .query_one(
                "SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
                &[&ledger::TABLE_NAME],
            )
            .await?;
        let count: i64 = row.get(0);

        if count > 0 {
            let row = client
                .query_one(
                    "SELECT data_type FROM information_schema.columns \
                     WHERE table_name = $1 AND column_name = 'version'",
                    &[&ledger::TABLE_NAME],
                )
                .await?;
            let data_type: String = row.get(0);
            if Self::needs_widen(&data_type) {
                client.batch_execute(&Self::widen_version_column_sql()).await?;
            }
            return Ok(());
        }

        client
            .batch_execute(&format!(
                "CREATE TABLE IF NOT EXISTS {} (version bigint not null primary key)",
                ledger::TABLE_NAME
            ))
            .await?;
        Ok(())
    }

    fn ledger_sql(direction: Direction) -> String {
        match direction {
            Direction::Up => ledger::insert_version_sql("$1"),
            Direction::Down => ledger::delete_version_sql("$1"),
        }
    }

    async fn apply(&mut self, file: &MigrationFile) -> std::result::Result<(), Vec<MigrateError>> {
        let content = file.content().map_err(|e| vec![e])?.to_string();
        let version = file.version;
        let direction = file.direction;
        let client = self.client().map_err(|e| vec![e])?;

        if transaction_disabled(&content) {
            // Autocommit path for statements that refuse to run inside a
            // transaction (CREATE INDEX CONCURRENTLY and friends). The
            // ledger mutation runs only after the whole batch succeeded.
            for stmt in statements(&content) {
                debug!(statement = stmt.text, "executing (no transaction)");
                client
                    .batch_execute(stmt.text)
                    .await
                    .map_err(|e| vec![decode_error(&e).into_diagnostic(&stmt)])?;
            }
            client
                .execute(&Self::ledger_sql(direction), &[&version])
                .await
                .map_err(|e| vec![e.into()])?;
            return Ok(());
        }

        let tx = client.transaction().await.map_err(|e| vec![e.into()])?;

        if let Err(e) = tx.execute(&Self::ledger_sql(direction), &[&version]).await {
            let mut errs = vec![MigrateError::from(e)];
            if let Err(rollback) = tx.rollback().await {
                errs.push(rollback.into());
            }
            return Err(errs);
        }

        for stmt in statements(&content) {
            debug!(statement = stmt.text, "executing");
            if let Err(e) = tx.batch_execute(stmt.text).await {
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
impl Driver for PostgresDriver {
    async fn initialize(&mut self, url: &str) -> Result<()> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
        let task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("postgres connection task ended: {e}");
            }
        });

        Self::ensure_version_table(&client).await?;
        info!("connected to postgres database");
        self.client = Some(client);
        self.connection_task = Some(task);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the client lets the background connection task finish.
        self.client.take();
        if let Some(task) = self.connection_task.take() {
            let _ = task.await;
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
        let client = self.client()?;
        let row = client.query_opt(&ledger::max_version_sql(), &[]).await?;
        Ok(row.map(|r| r.get::<_, i64>(0)).unwrap_or(0))
    }

    async fn versions(&mut self) -> Result<Versions> {
        let client = self.client()?;
        let rows = client.query(&ledger::all_versions_sql(), &[]).await?;
        Ok(rows.iter().map(|r| r.get::<_, i64>(0)).collect())
    }
}

/// Decode a tokio-postgres error into the common shape. Server errors carry
/// severity, SQLSTATE, and usually a 1-based byte position.
fn decode_error(err: &tokio_postgres::Error) -> DecodedError {
    match err.as_db_error() {
        Some(db) => {
            let byte_offset = match db.position() {
                // Postgres positions are 1-based byte offsets.
                Some(ErrorPosition::Original(pos)) => Some((*pos as usize).saturating_sub(1)),
                _ => None,
            };
            DecodedError {
                message: format!("{} {}: {}", db.severity(), db.code().code(), db.message()),
                byte_offset,
                line: None,
            }
        }
        None => DecodedError::message_only(err.to_string()),
    }
}
