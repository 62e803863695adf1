//! Composing located diagnostics from engine-native errors.
//!
//! Each adapter decodes its client's native error into [`DecodedError`], a
//! common shape the locator machinery consumes. This keeps the position
//! mapping engine-agnostic: the adapter knows how its engine reports a
//! position, nothing here does.

use crate::error::MigrateError;
use crate::position::{line_column_from_offset, lines_before_and_after};
use crate::statement::Statement;

/// Context window size, in lines, on each side of the failing line.
const CONTEXT_LINES: usize = 5;

/// Engine-agnostic shape of a decoded statement error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedError {
    /// Human-readable message, already carrying engine severity/code text.
    pub message: String,
    /// Byte offset of the failure within the executed statement, when the
    /// engine reports one (0-based).
    pub byte_offset: Option<usize>,
    /// 1-based line number within the executed statement, when the engine
    /// reports one instead of an offset.
    pub line: Option<usize>,
}

impl DecodedError {
    /// An error carrying no position information.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            byte_offset: None,
            line: None,
        }
    }

    /// Build the final error for the pipe, locating the failure within
    /// `stmt` when a position is available.
    ///
    /// The statement lost its leading blank lines to trimming, so the
    /// statement's whitespace-line offset is added back to the reported
    /// line number; the diagnostic then matches the file as written.
    pub fn into_diagnostic(self, stmt: &Statement<'_>) -> MigrateError {
        if let Some(offset) = self.byte_offset {
            let (line, column) = line_column_from_offset(stmt.text, offset);
            let reported = line + stmt.blank_line_offset;
            let context = lines_before_and_after(stmt.text, line, CONTEXT_LINES, CONTEXT_LINES, true);
            return MigrateError::Statement(format!(
                "{} in line {}, column {}:\n\n{}",
                self.message, reported, column, context
            ));
        }

        if let Some(line) = self.line {
            let reported = line + stmt.blank_line_offset;
            let context = lines_before_and_after(stmt.text, line, CONTEXT_LINES, CONTEXT_LINES, true);
            return MigrateError::Statement(format!(
                "{} at line {}:\n\n{}",
                self.message, reported, context
            ));
        }

        MigrateError::Statement(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(text: &str) -> Statement<'_> {
        Statement {
            text,
            blank_line_offset: 0,
        }
    }

    #[test]
    fn offset_diagnostic_has_line_column_and_context() {
        let text = "CREATE TABLE error (\n  id THIS WILL CAUSE AN ERROR\n)";
        let decoded = DecodedError {
            message: "ERROR 42601: syntax error".into(),
            byte_offset: Some(text.find("THIS").unwrap()),
            line: None,
        };
        let msg = decoded.into_diagnostic(&stmt(text)).to_string();
        assert!(msg.contains("in line 2, column 6:"), "got: {msg}");
        assert!(msg.contains("2:   id THIS WILL CAUSE AN ERROR"), "got: {msg}");
    }

    #[test]
    fn line_diagnostic_applies_blank_line_offset() {
        let decoded = DecodedError {
            message: "syntax error near 'WILL'".into(),
            byte_offset: None,
            line: Some(1),
        };
        let statement = Statement {
            text: "id THIS WILL CAUSE AN ERROR",
            blank_line_offset: 2,
        };
        let msg = decoded.into_diagnostic(&statement).to_string();
        // Line 1 of the trimmed statement was line 3 of the raw fragment.
        assert!(msg.contains("at line 3:"), "got: {msg}");
    }

    #[test]
    fn positionless_error_passes_message_through() {
        let decoded = DecodedError::message_only("connection reset");
        let msg = decoded.into_diagnostic(&stmt("SELECT 1")).to_string();
        assert_eq!(msg, "connection reset");
    }
}
