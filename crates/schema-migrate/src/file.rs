//! Migration file representation.
//!
//! A [`MigrationFile`] is one versioned, directional unit of schema change.
//! It is constructed by the discovery layer, handed to a driver once, and is
//! immutable from the driver's point of view. Content is loaded lazily so a
//! read failure can be reported independently of discovery.

use std::path::PathBuf;

use crate::error::{MigrateError, Result};

/// A migration version. Stored in the ledger as a 64-bit integer primary key.
pub type Version = i64;

/// A list of applied versions, descending, without duplicates.
pub type Versions = Vec<Version>;

/// Direction of a migration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Apply the change and record its version in the ledger.
    Up,
    /// Revert the change and remove its version from the ledger.
    Down,
}

/// One migration file on disk (or in memory, for tests).
#[derive(Debug, Clone)]
pub struct MigrationFile {
    /// Directory containing the file.
    pub path: PathBuf,

    /// File name within `path`.
    pub file_name: String,

    /// Version key. Shared by the up file and its down counterpart.
    pub version: Version,

    /// Human label. Not used for ordering.
    pub name: String,

    /// Up or Down.
    pub direction: Direction,

    /// Raw statement text, once read.
    pub content: Option<String>,
}

impl MigrationFile {
    /// Create a file whose content is already in memory.
    pub fn with_content(
        version: Version,
        name: impl Into<String>,
        direction: Direction,
        content: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let suffix = match direction {
            Direction::Up => "up",
            Direction::Down => "down",
        };
        Self {
            path: PathBuf::new(),
            file_name: format!("{version}_{name}.{suffix}.sql"),
            version,
            name,
            direction,
            content: Some(content.into()),
        }
    }

    /// Read the file's content from disk if it is not already loaded.
    pub fn read_content(&mut self) -> Result<()> {
        if self.content.is_none() {
            let full = self.path.join(&self.file_name);
            self.content = Some(std::fs::read_to_string(&full)?);
        }
        Ok(())
    }

    /// The loaded content, or an error if `read_content` has not run.
    pub fn content(&self) -> Result<&str> {
        self.content
            .as_deref()
            .ok_or_else(|| MigrateError::ContentNotRead(self.file_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_not_read_is_an_error() {
        let file = MigrationFile {
            path: PathBuf::from("/nowhere"),
            file_name: "1_x.up.sql".into(),
            version: 1,
            name: "x".into(),
            direction: Direction::Up,
            content: None,
        };
        assert!(matches!(
            file.content(),
            Err(MigrateError::ContentNotRead(_))
        ));
    }

    #[test]
    fn with_content_builds_file_name() {
        let file = MigrationFile::with_content(20060102150405, "foobar", Direction::Up, "SELECT 1");
        assert_eq!(file.file_name, "20060102150405_foobar.up.sql");
        assert_eq!(file.content().unwrap(), "SELECT 1");
    }

    #[test]
    fn read_content_reports_io_failure() {
        let mut file = MigrationFile {
            path: PathBuf::from("/nonexistent-dir"),
            file_name: "1_x.up.sql".into(),
            version: 1,
            name: "x".into(),
            direction: Direction::Up,
            content: None,
        };
        assert!(matches!(file.read_content(), Err(MigrateError::Io(_))));
    }
}
