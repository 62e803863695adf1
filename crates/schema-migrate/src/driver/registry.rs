//! Process-wide driver registry.
//!
//! Maps a URL scheme (the token before `://`) to a factory producing a fresh,
//! uninitialized driver. Builtin adapters are registered when the registry is
//! first touched; external adapters can add themselves with
//! [`register_driver`] before any lookups race with registration.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::error::{MigrateError, Result};

use super::{mssql, mysql, postgres, sqlite, Driver};

/// Constructor for a driver instance.
pub type DriverFactory = fn() -> Box<dyn Driver>;

static REGISTRY: Lazy<RwLock<HashMap<String, DriverFactory>>> = Lazy::new(|| {
    let mut map: HashMap<String, DriverFactory> = HashMap::new();
    map.insert("postgres".into(), || Box::new(postgres::PostgresDriver::new()));
    map.insert("mysql".into(), || Box::new(mysql::MysqlDriver::new()));
    map.insert("sqlite3".into(), || Box::new(sqlite::SqliteDriver::new()));
    map.insert("sqlite".into(), || Box::new(sqlite::SqliteDriver::new()));
    map.insert("mssql".into(), || Box::new(mssql::MssqlDriver::new()));
    RwLock::new(map)
});

/// Register a driver factory for a URL scheme, replacing any existing entry.
pub fn register_driver(scheme: &str, factory: DriverFactory) {
    REGISTRY
        .write()
        .expect("driver registry lock poisoned")
        .insert(scheme.to_string(), factory);
}

/// All registered schemes, unordered. Lets host tooling report which
/// engines a build supports without attempting a connection.
pub fn registered_schemes() -> Vec<String> {
    REGISTRY
        .read()
        .expect("driver registry lock poisoned")
        .keys()
        .cloned()
        .collect()
}

/// Look up the factory for a scheme.
fn lookup(scheme: &str) -> Result<DriverFactory> {
    REGISTRY
        .read()
        .expect("driver registry lock poisoned")
        .get(scheme)
        .copied()
        .ok_or_else(|| MigrateError::UnknownScheme(scheme.to_string()))
}

/// Construct and initialize the driver for a connection URL.
///
/// The scheme selects the driver; the full URL is handed to
/// [`Driver::initialize`], which strips or rewrites its own scheme prefix as
/// the engine's client requires.
pub async fn connect(url: &str) -> Result<Box<dyn Driver>> {
    let scheme = url
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .ok_or_else(|| MigrateError::InvalidUrl(format!("missing scheme in '{url}'")))?;

    let factory = lookup(scheme)?;
    let mut driver = factory();
    driver.initialize(url).await?;
    Ok(driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_schemes_are_registered() {
        let schemes = registered_schemes();
        for scheme in ["postgres", "mysql", "sqlite3", "mssql"] {
            assert!(schemes.iter().any(|s| s == scheme), "missing {scheme}");
        }
    }

    #[tokio::test]
    async fn unknown_scheme_is_a_typed_error() {
        let err = connect("voltdb://localhost/db").await.unwrap_err();
        assert!(matches!(err, MigrateError::UnknownScheme(s) if s == "voltdb"));
    }

    #[tokio::test]
    async fn url_without_scheme_is_rejected() {
        let err = connect("just-a-path").await.unwrap_err();
        assert!(matches!(err, MigrateError::InvalidUrl(_)));
    }
}
