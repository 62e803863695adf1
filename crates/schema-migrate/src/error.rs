//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// No driver has been registered for the URL scheme.
    #[error("no driver registered for scheme '{0}'")]
    UnknownScheme(String),

    /// The connection URL could not be parsed or is missing required parts.
    #[error("invalid connection url: {0}")]
    InvalidUrl(String),

    /// A driver method was called before `initialize` succeeded.
    #[error("driver is not initialized")]
    NotInitialized,

    /// The migration file's content has not been read yet.
    #[error("migration content for {0} has not been read")]
    ContentNotRead(String),

    /// A statement failed with a located, human-readable diagnostic.
    #[error("{0}")]
    Statement(String),

    /// PostgreSQL client error
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// MySQL client error
    #[error("mysql error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// SQLite client error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// SQL Server client error
    #[error("mssql error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    /// IO error (reading migration file content)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
