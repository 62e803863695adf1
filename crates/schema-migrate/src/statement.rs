//! Statement splitting and the per-file directive line.
//!
//! Several engine clients refuse multi-statement execution in a single call,
//! so migration text is split on `;` before execution. The split is
//! intentionally naive: it does not understand quoted string literals or
//! dialect-specific delimiters (stored-procedure bodies). Changing that would
//! change which statements succeed or fail on real migration files.

/// Directive token that disables transactional wrapping for one file.
pub const NO_TRANSACTION_DIRECTIVE: &str = "disable_ddl_transaction";

/// Comment prefix introducing the directive line.
const DIRECTIVE_PREFIX: &str = "-- ";

/// Split migration text into trimmed, non-empty statements, in order.
///
/// The `;` delimiter is discarded. Fragments that are empty after trimming
/// are dropped, so a trailing `;` does not produce an empty statement and
/// empty input yields an empty vec.
pub fn split_statements(content: &str) -> Vec<&str> {
    content
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// A split statement plus the number of leading all-whitespace lines that
/// trimming removed from its raw fragment.
///
/// Engine errors report positions within the trimmed statement; adding
/// `blank_line_offset` back to a reported line number makes the diagnostic
/// line up with the file as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    /// Trimmed statement text.
    pub text: &'a str,
    /// Leading blank lines stripped from the raw fragment.
    pub blank_line_offset: usize,
}

/// Split migration text, keeping the whitespace-line offset per statement.
pub fn statements(content: &str) -> Vec<Statement<'_>> {
    content
        .split(';')
        .filter_map(|fragment| {
            let text = fragment.trim();
            if text.is_empty() {
                return None;
            }
            Some(Statement {
                text,
                blank_line_offset: leading_blank_lines(fragment),
            })
        })
        .collect()
}

/// Count the leading lines of `fragment` that are entirely whitespace.
fn leading_blank_lines(fragment: &str) -> usize {
    fragment
        .lines()
        .take_while(|line| line.trim().is_empty())
        .count()
}

/// Options extracted from the first line of a migration file.
///
/// Format: `-- <option1> <option2> <...>`. Any other first line yields no
/// options. This is the only in-band configuration channel from file content
/// to adapter behavior.
pub fn file_options(content: &str) -> Vec<&str> {
    let first_line = content.lines().next().unwrap_or("");
    match first_line.strip_prefix(DIRECTIVE_PREFIX) {
        Some(opts) => opts.split(' ').filter(|o| !o.is_empty()).collect(),
        None => Vec::new(),
    }
}

/// Whether the file opts out of transactional wrapping.
pub fn transaction_disabled(content: &str) -> bool {
    file_options(content)
        .iter()
        .any(|o| *o == NO_TRANSACTION_DIRECTIVE)
}
