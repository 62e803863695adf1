//! # schema-migrate
//!
//! Versioned, reversible schema migrations across heterogeneous database
//! engines, behind one uniform driver protocol.
//!
//! Every backend adapter implements the same capability contract
//! ([`Driver`]), maintains the same persisted version ledger
//! (`schema_migrations`, one 64-bit primary-key column), and reports
//! progress and errors by streaming into a [`pipe`](crate::pipe) rather
//! than through return values. Migration text is split on `;` because
//! several engine clients refuse multi-statement execution, and statement
//! failures are mapped back to line/column positions in the file as
//! written.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_migrate::{connect, pipe, Direction, Driver, MigrationFile};
//!
//! #[tokio::main]
//! async fn main() -> schema_migrate::Result<()> {
//!     let mut driver = connect("sqlite3:///var/lib/app/app.db").await?;
//!
//!     let file = MigrationFile::with_content(
//!         20060102150405,
//!         "create_yolo",
//!         Direction::Up,
//!         "CREATE TABLE yolo (id INT PRIMARY KEY);",
//!     );
//!
//!     let (tx, rx) = pipe::pipe();
//!     driver.migrate(file, tx).await;
//!     let (_started, errors) = rx.drain().await;
//!     assert!(errors.is_empty());
//!
//!     println!("now at version {}", driver.version().await?);
//!     driver.close().await
//! }
//! ```

pub mod driver;
pub mod error;
pub mod file;
pub mod ledger;
pub mod pipe;
pub mod position;
pub mod statement;

// Re-exports for convenient access
pub use driver::{connect, register_driver, registered_schemes, DecodedError, Driver, DriverFactory};
pub use error::{MigrateError, Result};
pub use file::{Direction, MigrationFile, Version, Versions};
pub use pipe::{PipeEvent, PipeReceiver, PipeSender};
