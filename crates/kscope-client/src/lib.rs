// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Trace server transport for KernelScope.
//!
//! [`TraceBackend`] is the capability the rest of the workspace consumes;
//! [`HttpBackend`] implements it over reqwest. [`BlockSession`] adapts it to a
//! synchronous frame loop and enforces the liveness guard: results for a block
//! the user already left are discarded on arrival.

pub mod backend;
pub mod error;
pub mod http;
pub mod session;

pub use backend::{load_block, load_catalog, BlockData, TraceBackend};
pub use error::TransportError;
pub use http::HttpBackend;
pub use session::{BlockScope, BlockSession, SessionUpdate};
