// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Trace events and variable updates, plus tolerant decoding from the
//! `/process_blocks` response.
//!
//! Decoding never fails because of a single bad entry. An event that is not an
//! object or lacks its `source_line` is dropped; a variable update without
//! `data` (or with mis-typed fields) is dropped from its event. Both are
//! reported with `tracing::warn!` and counted in [`DecodeStats`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::TraceError;

/// Dims assumed when an update omits them: no axis is valid, so the value is
/// treated as a scalar.
pub const DEFAULT_DIMS: [i64; 3] = [-1, -1, -1];

fn default_dims() -> Vec<i64> {
    DEFAULT_DIMS.to_vec()
}

/// New value of one variable as recorded by a trace event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableUpdate {
    /// Scalar or (nested) array payload.
    pub data: Value,
    /// Array extents; entries `<= 0` are not real axes.
    #[serde(default = "default_dims")]
    pub dims: Vec<i64>,
    /// Coordinates rendered as highlighted, independent of value.
    #[serde(
        default,
        alias = "highlighted_indices",
        skip_serializing_if = "Option::is_none"
    )]
    pub highlighted_coords: Option<Vec<Vec<i64>>>,
}

impl VariableUpdate {
    /// Scalar update with default dims.
    pub fn scalar(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            dims: default_dims(),
            highlighted_coords: None,
        }
    }

    /// Array update with explicit dims.
    pub fn tensor(data: impl Into<Value>, dims: Vec<i64>) -> Self {
        Self {
            data: data.into(),
            dims,
            highlighted_coords: None,
        }
    }

    /// Attach a highlight set.
    #[must_use]
    pub fn with_highlights(mut self, coords: Vec<Vec<i64>>) -> Self {
        self.highlighted_coords = Some(coords);
        self
    }

    /// Dims that name a real axis (`> 0`), in order.
    pub fn valid_dims(&self) -> Vec<usize> {
        self.dims
            .iter()
            .filter(|&&d| d > 0)
            .filter_map(|&d| usize::try_from(d).ok())
            .collect()
    }

    /// Decode one `changed_vars` entry.
    ///
    /// Objects must carry `data`; any other JSON value is taken verbatim as
    /// scalar data with default dims.
    pub fn from_json(name: &str, value: &Value) -> Result<Self, TraceError> {
        match value {
            Value::Object(map) => {
                if !map.contains_key("data") {
                    return Err(TraceError::MissingData(name.to_owned()));
                }
                serde_json::from_value(value.clone()).map_err(|source| {
                    TraceError::MalformedUpdate {
                        name: name.to_owned(),
                        source,
                    }
                })
            }
            other => Ok(Self::scalar(other.clone())),
        }
    }
}

/// One recorded execution step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Literal text of the source line the step executed.
    pub source_line: String,
    /// Variables changed by this step.
    #[serde(default)]
    pub changed_vars: BTreeMap<String, VariableUpdate>,
}

impl TraceEvent {
    /// Event on `source_line` with no changes yet.
    pub fn new(source_line: impl Into<String>) -> Self {
        Self {
            source_line: source_line.into(),
            changed_vars: BTreeMap::new(),
        }
    }

    /// Builder-style variable insertion.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, update: VariableUpdate) -> Self {
        self.changed_vars.insert(name.into(), update);
        self
    }

    /// Decode one `results` entry, dropping malformed variable updates.
    ///
    /// Returns the event together with the number of updates that were dropped.
    pub fn from_json(value: &Value) -> Result<(Self, usize), TraceError> {
        let obj = value.as_object().ok_or(TraceError::EventNotObject)?;
        let source_line = obj
            .get("source_line")
            .and_then(Value::as_str)
            .ok_or(TraceError::MissingSourceLine)?
            .to_owned();

        let mut changed_vars = BTreeMap::new();
        let mut dropped = 0;
        match obj.get("changed_vars") {
            None | Some(Value::Null) => {}
            Some(Value::Object(vars)) => {
                for (name, raw) in vars {
                    match VariableUpdate::from_json(name, raw) {
                        Ok(update) => {
                            changed_vars.insert(name.clone(), update);
                        }
                        Err(err) => {
                            warn!(%source_line, variable = %name, error = %err, "dropping malformed variable update");
                            dropped += 1;
                        }
                    }
                }
            }
            Some(_) => return Err(TraceError::ChangedVarsNotObject),
        }

        Ok((
            Self {
                source_line,
                changed_vars,
            },
            dropped,
        ))
    }
}

/// Counters describing what decoding dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Events dropped entirely.
    pub skipped_events: usize,
    /// Individual variable updates dropped from otherwise valid events.
    pub skipped_updates: usize,
}

/// Ordered sequence of trace events for one block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    events: Vec<TraceEvent>,
    stats: DecodeStats,
}

impl Trace {
    /// Wrap already-decoded events.
    pub fn new(events: Vec<TraceEvent>) -> Self {
        Self {
            events,
            stats: DecodeStats::default(),
        }
    }

    /// Decode a `/process_blocks` response body: `{ "results": [ ... ] }`.
    ///
    /// Fails only when `results` is absent or not an array.
    pub fn from_response(body: &Value) -> Result<Self, TraceError> {
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or(TraceError::MissingResults)?;

        let mut events = Vec::with_capacity(results.len());
        let mut stats = DecodeStats::default();
        for (idx, raw) in results.iter().enumerate() {
            match TraceEvent::from_json(raw) {
                Ok((event, dropped)) => {
                    stats.skipped_updates += dropped;
                    events.push(event);
                }
                Err(err) => {
                    warn!(index = idx, error = %err, "dropping malformed trace event");
                    stats.skipped_events += 1;
                }
            }
        }
        Ok(Self { events, stats })
    }

    /// Events in execution order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// What decoding dropped.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Number of events kept.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events were kept.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<TraceEvent> for Trace {
    fn from_iter<I: IntoIterator<Item = TraceEvent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
