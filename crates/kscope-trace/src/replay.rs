// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Replay: fold trace events into the variable state visible at a cursor line.
//!
//! The snapshot is a pure function of `(trace, source, cursor)` and is rebuilt
//! from scratch on every call. An event contributes when the line it resolves to
//! is at or before the cursor; contributions merge last-write-wins in execution
//! order, so an event recorded later in the trace overrides an earlier one even
//! if it sits on a smaller line number.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cursor::InterestingLines;
use crate::event::{Trace, TraceEvent, VariableUpdate};
use crate::source::SourceIndex;

/// Variable name to its most recent update, sorted by name.
pub type VariableState = BTreeMap<String, VariableUpdate>;

/// Replay `trace` against `source` up to and including line `cursor`.
///
/// Events whose `source_line` does not resolve are skipped.
pub fn compute_state(trace: &Trace, source: &SourceIndex, cursor: usize) -> VariableState {
    fold(
        trace
            .events()
            .iter()
            .map(|event| (resolve(source, event), event)),
        cursor,
    )
}

fn resolve(source: &SourceIndex, event: &TraceEvent) -> Option<usize> {
    let line = source.lookup(&event.source_line);
    if line.is_none() {
        debug!(source_line = %event.source_line, "trace event line not found in source; skipping");
    }
    line
}

fn fold<'a, I>(events: I, cursor: usize) -> VariableState
where
    I: IntoIterator<Item = (Option<usize>, &'a TraceEvent)>,
{
    let mut state = VariableState::new();
    for (line, event) in events {
        let Some(line) = line else { continue };
        if line > cursor {
            continue;
        }
        for (name, update) in &event.changed_vars {
            state.insert(name.clone(), update.clone());
        }
    }
    state
}

/// A trace paired with its source, with every event's line resolved once.
///
/// Use this when the cursor moves repeatedly over the same block: resolving is
/// done at construction, and each [`ResolvedTrace::state_at`] call only folds.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTrace {
    trace: Trace,
    source: SourceIndex,
    lines: Vec<Option<usize>>,
}

impl ResolvedTrace {
    /// Resolve all events of `trace` against `source`.
    pub fn new(trace: Trace, source: SourceIndex) -> Self {
        let lines = trace
            .events()
            .iter()
            .map(|event| resolve(&source, event))
            .collect();
        Self {
            trace,
            source,
            lines,
        }
    }

    /// Snapshot at `cursor`; same result as [`compute_state`].
    pub fn state_at(&self, cursor: usize) -> VariableState {
        fold(
            self.lines.iter().copied().zip(self.trace.events()),
            cursor,
        )
    }

    /// Distinct resolved lines in first-occurrence order.
    pub fn interesting_lines(&self) -> InterestingLines {
        self.lines.iter().flatten().copied().collect()
    }

    /// Resolved line for each event (`None` when unresolved), in event order.
    pub fn resolved_lines(&self) -> &[Option<usize>] {
        &self.lines
    }

    /// Number of events whose line could not be resolved.
    pub fn unresolved_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_none()).count()
    }

    /// Underlying trace.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Underlying source index.
    pub fn source(&self) -> &SourceIndex {
        &self.source
    }
}
