//! Non-blank line counting over a node's source span.
//!
//! This is a textual measure: comment-only lines count, whitespace-only lines
//! do not.

use crate::parse::SyntaxRef;

/// Count non-blank lines in the inclusive 1-based line range `[start, end]`.
///
/// Lines past the end of `source` are ignored.
pub fn count_non_blank_lines(source: &str, start: usize, end: usize) -> usize {
    if start == 0 || end < start {
        return 0;
    }

    source
        .lines()
        .skip(start - 1)
        .take(end - start + 1)
        .filter(|line| !line.trim().is_empty())
        .count()
}

/// Non-blank line count of the node behind a [`SyntaxRef`].
pub fn line_extent(source: &str, node: &SyntaxRef) -> usize {
    count_non_blank_lines(source, node.start_line, node.end_line)
}
