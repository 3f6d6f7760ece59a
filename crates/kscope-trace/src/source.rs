// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Source index: literal source text to 1-based line numbers.
//!
//! Trace events identify their position by the text of the source line rather
//! than by a number. Matching strips surrounding whitespace on both sides and
//! the earliest matching line wins, so a line repeated verbatim (a loop body
//! copied twice, say) always attributes to its first occurrence. The trace
//! format carries no line numbers that could disambiguate.

use std::collections::HashMap;

/// Linear first-match lookup over raw lines.
///
/// Returns the 1-based line number of the first line whose trimmed text equals
/// the trimmed `target`, or `None` when nothing matches.
pub fn find_line<S: AsRef<str>>(lines: &[S], target: &str) -> Option<usize> {
    let target = target.trim();
    lines
        .iter()
        .position(|line| line.as_ref().trim() == target)
        .map(|idx| idx + 1)
}

/// Immutable index over the source of one kernel.
///
/// Lookups are O(1): the trimmed text of every line is mapped to its first
/// occurrence when the index is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceIndex {
    lines: Vec<String>,
    first: HashMap<String, usize>,
}

impl SourceIndex {
    /// Build an index from individual lines; index 0 becomes line 1.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let mut first = HashMap::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            first.entry(line.trim().to_owned()).or_insert(idx + 1);
        }
        Self { lines, first }
    }

    /// Build an index from newline-delimited source text (as served by `/get_src`).
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    /// Resolve `target` to its first matching 1-based line number.
    pub fn lookup(&self, target: &str) -> Option<usize> {
        self.first.get(target.trim()).copied()
    }

    /// Text of the given 1-based line.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// All lines in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the source has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_surrounding_whitespace() {
        let idx = SourceIndex::new(["def k(x):", "    a = x + 1", "    return a"]);
        assert_eq!(idx.lookup("a = x + 1"), Some(2));
        assert_eq!(idx.lookup("  return a  "), Some(3));
    }

    #[test]
    fn duplicate_lines_resolve_to_first() {
        let idx = SourceIndex::new(["for i in r:", "  acc += i", "for j in r:", "  acc += i"]);
        assert_eq!(idx.lookup("acc += i"), Some(2));
        assert_eq!(find_line(idx.lines(), "acc += i"), Some(2));
    }

    #[test]
    fn missing_line_is_none() {
        let idx = SourceIndex::from_text("a = 1\nb = 2\n");
        assert_eq!(idx.lookup("c = 3"), None);
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn line_accessor_is_one_based() {
        let idx = SourceIndex::from_text("x\ny");
        assert_eq!(idx.line(0), None);
        assert_eq!(idx.line(1), Some("x"));
        assert_eq!(idx.line(2), Some("y"));
        assert_eq!(idx.line(3), None);
    }
}
