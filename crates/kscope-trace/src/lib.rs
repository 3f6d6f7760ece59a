// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Trace replay engine for KernelScope.
//!
//! A kernel trace is an ordered list of events, each naming the source line it
//! was recorded on and the variables it changed. This crate turns that list
//! into point-in-time variable snapshots:
//!
//! - [`source`]: map literal source lines to 1-based line numbers.
//! - [`event`]: tolerant decoding of the wire format into [`TraceEvent`]s.
//! - [`replay`]: fold events into a [`VariableState`] for a cursor line.
//! - [`cursor`]: the set of interesting lines and the cursor state machine.
//! - [`classify`]: split a snapshot into renderable tensors and text entries.
//! - [`grid`]: the block catalog used to pick which program instance to inspect.
//!
//! Everything here is synchronous and pure; transport lives in `kscope-client`.

pub mod classify;
pub mod cursor;
pub mod error;
pub mod event;
pub mod grid;
pub mod replay;
pub mod source;

pub use classify::{classify, is_tensor_shape, Classified, OtherEntry, TensorEntry};
pub use cursor::{Cursor, CursorNavigator, InterestingLines, NavKey};
pub use error::TraceError;
pub use event::{DecodeStats, Trace, TraceEvent, VariableUpdate, DEFAULT_DIMS};
pub use grid::{AxisFilter, BlockCatalog, BlockCoord, GridSlot};
pub use replay::{compute_state, ResolvedTrace, VariableState};
pub use source::{find_line, SourceIndex};
