//! Line diff of two raw values, for showing what changed in a leaf that
//! has no structure to compare.
//!
//! Uses the `similar` crate (Myers diff algorithm) to produce hunks with
//! context lines. Content that is not UTF-8 is only ever equal or unequal.

use std::fmt;

use similar::{ChangeTag, TextDiff};

/// Lines of context kept around each change.
const CONTEXT_LINES: usize = 3;

/// Line-level difference between two values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineDiff {
    /// The diff hunks.
    pub hunks: Vec<DiffHunk>,
    /// Set when either side is not UTF-8; `hunks` is then empty.
    pub binary: bool,
}

impl LineDiff {
    /// Returns `true` if there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty() && !self.binary
    }

    /// Total number of lines added across all hunks.
    pub fn additions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, DiffLine::Added(_)))
            .count()
    }

    /// Total number of lines removed across all hunks.
    pub fn deletions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, DiffLine::Removed(_)))
            .count()
    }
}

/// A contiguous region of changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Line number in the old content where this hunk starts (1-based).
    pub old_start: usize,
    pub old_count: usize,
    /// Line number in the new content where this hunk starts (1-based).
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl fmt::Display for DiffHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// A single line in a diff hunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// A line present on both sides.
    Context(String),
    Added(String),
    Removed(String),
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(text) => write!(f, " {text}"),
            Self::Added(text) => write!(f, "+{text}"),
            Self::Removed(text) => write!(f, "-{text}"),
        }
    }
}

/// Compute a line diff between two values. An absent side diffs as empty.
pub fn render_text_diff(old: Option<&[u8]>, new: Option<&[u8]>) -> LineDiff {
    let old = old.unwrap_or_default();
    let new = new.unwrap_or_default();
    let (Ok(old_str), Ok(new_str)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return LineDiff {
            hunks: Vec::new(),
            binary: old != new,
        };
    };

    if old_str == new_str {
        return LineDiff {
            hunks: Vec::new(),
            binary: false,
        };
    }

    let text_diff = TextDiff::from_lines(old_str, new_str);
    let mut hunks = Vec::new();

    for group in text_diff.grouped_ops(CONTEXT_LINES) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };

        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.lines.push(DiffLine::Context(text));
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    ChangeTag::Delete => {
                        hunk.lines.push(DiffLine::Removed(text));
                        hunk.old_count += 1;
                    }
                    ChangeTag::Insert => {
                        hunk.lines.push(DiffLine::Added(text));
                        hunk.new_count += 1;
                    }
                }
            }
        }
        hunks.push(hunk);
    }

    LineDiff {
        hunks,
        binary: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(old: &[u8], new: &[u8]) -> LineDiff {
        render_text_diff(Some(old), Some(new))
    }

    #[test]
    fn identical_values_no_hunks() {
        let content = b"hello\nworld\n";
        let result = diff(content, content);
        assert!(result.is_empty());
    }

    #[test]
    fn single_line_addition() {
        let result = diff(b"line1\nline2\n", b"line1\nline2\nline3\n");
        assert_eq!(result.additions(), 1);
        assert_eq!(result.deletions(), 0);
    }

    #[test]
    fn modification_shows_remove_and_add() {
        let result = diff(b"hello world\n", b"hello universe\n");
        assert_eq!(result.additions(), 1);
        assert_eq!(result.deletions(), 1);
    }

    #[test]
    fn absent_side_is_empty() {
        let added = render_text_diff(None, Some(b"new content\n"));
        assert_eq!(added.additions(), 1);
        let deleted = render_text_diff(Some(b"old\n"), None);
        assert_eq!(deleted.deletions(), 1);
    }

    #[test]
    fn binary_is_flagged_without_hunks() {
        let result = diff(&[0u8, 0xFF, 0xFE], &[1u8, 0xFF, 0xFD]);
        assert!(result.binary);
        assert!(result.hunks.is_empty());
        assert!(!result.is_empty());
    }

    #[test]
    fn hunk_header_and_lines_render() {
        let result = diff(b"a\nb\nc\n", b"a\nX\nc\n");
        assert_eq!(result.hunks.len(), 1);
        let rendered = result.hunks[0].to_string();
        assert!(rendered.starts_with("@@ -1,3 +1,3 @@\n"));
        assert!(rendered.contains("-b\n"));
        assert!(rendered.contains("+X\n"));
        assert!(rendered.contains(" a\n"));
    }

    #[test]
    fn distant_changes_make_separate_hunks() {
        let old = b"1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\n12\n";
        let new = b"X\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\nY\n";
        assert_eq!(diff(old, new).hunks.len(), 2);
    }
}
