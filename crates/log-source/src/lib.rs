//! Log Source
//!
//! The file-access capability the dashboard core reads sensor logs through.
//! Implementations fetch the trailing lines of a growing CSV log, the whole
//! log, or append a line to it. The aggregation core only sees the
//! [`LogSource`] trait; the application owns the concrete source and its
//! lifecycle (`open` before the first fetch, `close` on shutdown).

mod error;
mod file;
mod memory;
mod source;

pub use error::SourceError;
pub use file::LocalFileSource;
pub use memory::MemorySource;
pub use source::LogSource;

/// Keep only the last `max_lines` non-empty lines of `text`.
///
/// Blank lines are not counted, so a trailing newline or padding at the
/// end of a log never eats into the line budget.
pub fn last_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    let skip = lines.len().saturating_sub(max_lines);
    lines[skip..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_lines_shorter_than_budget() {
        assert_eq!(last_lines("a\nb\n", 5), "a\nb");
    }

    #[test]
    fn test_last_lines_trims_to_budget() {
        assert_eq!(last_lines("a\nb\nc\nd\n", 2), "c\nd");
    }

    #[test]
    fn test_last_lines_skips_blank_lines() {
        assert_eq!(last_lines("a\n\nb\n\n\n", 2), "a\nb");
        assert_eq!(last_lines("", 3), "");
        assert_eq!(last_lines("a\nb", 0), "");
    }
}
