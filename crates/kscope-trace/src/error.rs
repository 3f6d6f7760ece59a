// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type for trace and catalog decoding.

use thiserror::Error;

/// Errors raised while decoding trace responses or block catalogs.
///
/// Only [`TraceError::MissingResults`] and [`TraceError::MissingCatalog`] reject
/// a whole payload; the remaining variants describe a single event or variable
/// and are logged and skipped by the decoder.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Response body has no top-level `results` array.
    #[error("trace response has no `results` array")]
    MissingResults,
    /// A `results` entry is not a JSON object.
    #[error("trace event is not an object")]
    EventNotObject,
    /// A `results` entry has no string `source_line`.
    #[error("trace event is missing a string `source_line`")]
    MissingSourceLine,
    /// `changed_vars` is present but is not an object.
    #[error("`changed_vars` is not an object")]
    ChangedVarsNotObject,
    /// A variable update object lacks its `data` field.
    #[error("variable `{0}` has no `data` field")]
    MissingData(String),
    /// A variable update has fields of the wrong shape (e.g. non-integer dims).
    #[error("variable `{name}` is malformed: {source}")]
    MalformedUpdate {
        /// Variable name as it appeared in `changed_vars`.
        name: String,
        /// Underlying deserialization failure.
        #[source]
        source: serde_json::Error,
    },
    /// Catalog body has no `ops.visualization_data` object.
    #[error("block catalog has no `ops.visualization_data` object")]
    MissingCatalog,
    /// A block key or coordinate string could not be parsed.
    #[error("invalid block coordinate `{0}`")]
    InvalidBlock(String),
}
