//! The driver contract and its backend adapters.
//!
//! A [`Driver`] owns exactly one backend connection. The orchestrator picks
//! one from the registry by URL scheme, calls [`Driver::migrate`] on its own
//! task, and drains the pipe to decide success or failure. A single driver
//! instance must not have two `migrate` calls in flight: the connection's
//! transaction state belongs to one call for its whole duration.

mod diagnostics;
mod registry;

pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use diagnostics::DecodedError;
pub use registry::{connect, register_driver, registered_schemes, DriverFactory};

use async_trait::async_trait;

use crate::error::Result;
use crate::file::{MigrationFile, Version, Versions};
use crate::pipe::PipeSender;

/// Capability contract every backend adapter implements.
///
/// `initialize` and `close` bound the instance's lifetime. `migrate` is
/// fire-and-forget: it never reports through a return value, only through
/// the pipe, and it closes the pipe on every exit path.
#[async_trait]
pub trait Driver: Send {
    /// Connect to the backend at `url` and ensure the version ledger table
    /// exists (creating or widening it idempotently). Connection and
    /// ledger-schema failures are returned here, never via a pipe.
    async fn initialize(&mut self, url: &str) -> Result<()>;

    /// Release the backend connection.
    async fn close(&mut self) -> Result<()>;

    /// File extension of migration files this driver executes.
    fn filename_extension(&self) -> &'static str;

    /// Apply one migration file, streaming the started acknowledgment and
    /// any errors into `pipe`. The pipe is closed when this returns.
    async fn migrate(&mut self, file: MigrationFile, pipe: PipeSender);

    /// The maximum applied version, or `0` when the ledger is empty.
    async fn version(&mut self) -> Result<Version>;

    /// All applied versions, descending, without duplicates.
    async fn versions(&mut self) -> Result<Versions>;
}

impl std::fmt::Debug for dyn Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Driver")
    }
}
