//! Mapping engine-reported error positions to human-readable file locations.
//!
//! Engines report either a byte offset or a 1-based line number. Operators
//! want a line/column and a window of surrounding lines from the file as
//! written. Both operations are pure.

/// Map a byte offset into `content` to a 1-based (line, column) pair.
///
/// Scans forward counting line breaks and the column since the last break.
/// Offsets past the end of the content are clamped to the last position.
pub fn line_column_from_offset(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let mut line = 1;
    let mut column = 1;
    for byte in content.as_bytes()[..offset].iter() {
        if *byte == b'\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Extract up to `before` lines before and `after` lines after the 1-based
/// `line`, clamped at the content boundaries.
///
/// With `line_numbers` set, each line is prefixed with its zero-padded
/// 1-based number. Never panics, even for `line` at the first or last line
/// or beyond the end of the content.
pub fn lines_before_and_after(
    content: &str,
    line: usize,
    before: usize,
    after: usize,
    line_numbers: bool,
) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let start = line.saturating_sub(before).saturating_sub(1);
    let end = (line + after).min(lines.len());
    if start >= end {
        return String::new();
    }

    let width = end.to_string().len();
    let mut out = Vec::with_capacity(end - start);
    for (idx, text) in lines[start..end].iter().enumerate() {
        if line_numbers {
            out.push(format!("{:0width$}: {}", start + idx + 1, text));
        } else {
            out.push((*text).to_string());
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_at_start() {
        assert_eq!(line_column_from_offset("abc", 0), (1, 1));
    }

    #[test]
    fn offset_within_first_line() {
        assert_eq!(line_column_from_offset("abc\ndef", 2), (1, 3));
    }

    #[test]
    fn offset_on_later_line() {
        // "abc\ndef": offset 4 is 'd', first column of line 2.
        assert_eq!(line_column_from_offset("abc\ndef", 4), (2, 1));
        assert_eq!(line_column_from_offset("abc\ndef", 6), (2, 3));
    }

    #[test]
    fn offset_past_end_is_clamped() {
        assert_eq!(line_column_from_offset("abc", 100), (1, 4));
        assert_eq!(line_column_from_offset("", 5), (1, 1));
    }

    #[test]
    fn window_clamps_at_file_start() {
        let content = "one\ntwo\nthree";
        let window = lines_before_and_after(content, 1, 5, 1, false);
        assert_eq!(window, "one\ntwo");
    }

    #[test]
    fn window_clamps_at_file_end() {
        let content = "one\ntwo\nthree";
        let window = lines_before_and_after(content, 3, 1, 5, false);
        assert_eq!(window, "two\nthree");
    }

    #[test]
    fn window_with_line_numbers() {
        let content = "one\ntwo\nthree";
        let window = lines_before_and_after(content, 2, 1, 1, true);
        assert_eq!(window, "1: one\n2: two\n3: three");
    }

    #[test]
    fn window_beyond_content_is_empty() {
        assert_eq!(lines_before_and_after("one", 50, 2, 2, true), "");
    }

    #[test]
    fn window_numbers_are_padded() {
        let content = (1..=12).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let window = lines_before_and_after(&content, 10, 1, 1, true);
        assert_eq!(window, "09: line9\n10: line10\n11: line11");
    }
}
