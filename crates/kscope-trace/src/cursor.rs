// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Interesting lines and the cursor that walks them.

use std::collections::HashSet;

use crate::event::Trace;
use crate::source::SourceIndex;

/// Distinct source lines referenced by trace events, in first-occurrence order.
///
/// The set only grows; [`InterestingLines::observe`] ignores lines already seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestingLines {
    order: Vec<usize>,
    seen: HashSet<usize>,
}

impl InterestingLines {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines referenced by `trace` that resolve in `source`.
    pub fn from_trace(trace: &Trace, source: &SourceIndex) -> Self {
        trace
            .events()
            .iter()
            .filter_map(|event| source.lookup(&event.source_line))
            .collect()
    }

    /// Record `line`; returns `true` when it was new.
    pub fn observe(&mut self, line: usize) -> bool {
        if self.seen.insert(line) {
            self.order.push(line);
            true
        } else {
            false
        }
    }

    /// True when `line` has been observed.
    pub fn contains(&self, line: usize) -> bool {
        self.seen.contains(&line)
    }

    /// Index of `line` in first-occurrence order.
    pub fn position(&self, line: usize) -> Option<usize> {
        if !self.contains(line) {
            return None;
        }
        self.order.iter().position(|&l| l == line)
    }

    /// Line at `index` in first-occurrence order.
    pub fn get(&self, index: usize) -> Option<usize> {
        self.order.get(index).copied()
    }

    /// First observed line.
    pub fn first(&self) -> Option<usize> {
        self.order.first().copied()
    }

    /// Lines in first-occurrence order.
    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no line has been observed.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<usize> for InterestingLines {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut lines = Self::new();
        for line in iter {
            lines.observe(line);
        }
        lines
    }
}

impl Extend<usize> for InterestingLines {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for line in iter {
            self.observe(line);
        }
    }
}

/// Where the cursor sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    /// No block loaded.
    #[default]
    Unset,
    /// On a 1-based source line.
    At(usize),
}

impl Cursor {
    /// Line number, if set.
    pub const fn line(self) -> Option<usize> {
        match self {
            Self::Unset => None,
            Self::At(line) => Some(line),
        }
    }
}

/// Navigation keys understood by [`CursorNavigator::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    /// Next interesting line (ArrowDown / ArrowRight).
    Forward,
    /// Previous interesting line (ArrowUp / ArrowLeft).
    Backward,
}

/// Cursor state machine over a block's interesting lines.
///
/// Stepping saturates at both ends. While the line set is empty every
/// transition is a no-op, even though `load` parks the cursor on line 1.
#[derive(Debug, Clone, Default)]
pub struct CursorNavigator {
    lines: InterestingLines,
    cursor: Cursor,
}

impl CursorNavigator {
    /// Navigator with no block loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a block's lines and place the cursor on the first one (line 1 when
    /// there are none).
    pub fn load(&mut self, lines: InterestingLines) -> Cursor {
        self.cursor = Cursor::At(lines.first().unwrap_or(1));
        self.lines = lines;
        self.cursor
    }

    /// Forget the loaded block.
    pub fn reset(&mut self) {
        self.lines = InterestingLines::new();
        self.cursor = Cursor::Unset;
    }

    /// Current cursor.
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Current line, if any.
    pub const fn line(&self) -> Option<usize> {
        self.cursor.line()
    }

    /// Loaded lines.
    pub const fn lines(&self) -> &InterestingLines {
        &self.lines
    }

    /// Add a line without moving the cursor.
    pub fn observe(&mut self, line: usize) -> bool {
        self.lines.observe(line)
    }

    fn current_index(&self) -> Option<usize> {
        self.cursor.line().and_then(|l| self.lines.position(l))
    }

    fn move_to_index(&mut self, index: usize) -> bool {
        match self.lines.get(index) {
            Some(line) if self.cursor != Cursor::At(line) => {
                self.cursor = Cursor::At(line);
                true
            }
            _ => false,
        }
    }

    /// Move to the next interesting line. Returns `true` when the cursor moved.
    pub fn step_forward(&mut self) -> bool {
        if self.lines.is_empty() {
            return false;
        }
        let target = self.current_index().map_or(0, |idx| idx + 1);
        self.move_to_index(target)
    }

    /// Move to the previous interesting line. Returns `true` when the cursor moved.
    pub fn step_backward(&mut self) -> bool {
        if self.lines.is_empty() {
            return false;
        }
        match self.current_index() {
            Some(idx) => idx.checked_sub(1).is_some_and(|prev| self.move_to_index(prev)),
            None => self.move_to_index(0),
        }
    }

    /// Jump straight to `line` if it is interesting.
    pub fn jump_to(&mut self, line: usize) -> bool {
        if !self.lines.contains(line) || self.cursor == Cursor::At(line) {
            return false;
        }
        self.cursor = Cursor::At(line);
        true
    }

    /// Dispatch a navigation key.
    pub fn handle(&mut self, key: NavKey) -> bool {
        match key {
            NavKey::Forward => self.step_forward(),
            NavKey::Backward => self.step_backward(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TraceEvent;

    #[test]
    fn observe_keeps_first_occurrence_order() {
        let lines: InterestingLines = [5, 2, 5, 9, 2].into_iter().collect();
        assert_eq!(lines.as_slice(), &[5, 2, 9]);
        assert_eq!(lines.position(9), Some(2));
        assert_eq!(lines.position(3), None);
    }

    #[test]
    fn from_trace_skips_unresolved_lines() {
        let source = SourceIndex::new(["a = 1", "b = 2"]);
        let trace: Trace = [
            TraceEvent::new("b = 2"),
            TraceEvent::new("nope"),
            TraceEvent::new("a = 1"),
        ]
        .into_iter()
        .collect();
        let lines = InterestingLines::from_trace(&trace, &source);
        assert_eq!(lines.as_slice(), &[2, 1]);
    }

    #[test]
    fn load_empty_parks_on_line_one_and_ignores_keys() {
        let mut nav = CursorNavigator::new();
        assert_eq!(nav.cursor(), Cursor::Unset);
        assert_eq!(nav.load(InterestingLines::new()), Cursor::At(1));
        assert!(!nav.handle(NavKey::Forward));
        assert!(!nav.handle(NavKey::Backward));
        assert_eq!(nav.line(), Some(1));
    }

    #[test]
    fn jump_only_to_interesting_lines() {
        let mut nav = CursorNavigator::new();
        nav.load([3, 7].into_iter().collect());
        assert!(!nav.jump_to(4));
        assert!(nav.jump_to(7));
        assert_eq!(nav.line(), Some(7));
        assert!(!nav.jump_to(7));
    }

    #[test]
    fn observe_grows_without_moving() {
        let mut nav = CursorNavigator::new();
        nav.load([3].into_iter().collect());
        assert!(nav.observe(8));
        assert_eq!(nav.line(), Some(3));
        assert!(nav.step_forward());
        assert_eq!(nav.line(), Some(8));
    }

    #[test]
    fn reset_clears_block() {
        let mut nav = CursorNavigator::new();
        nav.load([3].into_iter().collect());
        nav.reset();
        assert_eq!(nav.cursor(), Cursor::Unset);
        assert!(nav.lines().is_empty());
    }
}
