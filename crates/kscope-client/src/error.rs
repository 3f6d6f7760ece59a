// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transport errors.

use kscope_trace::TraceError;
use thiserror::Error;

/// Failure fetching or decoding data from the trace server. Never retried.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be sent or its body could not be read.
    #[error("request to {endpoint} failed: {source}")]
    Http {
        /// Endpoint path.
        endpoint: &'static str,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// Server answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// Endpoint path.
        endpoint: &'static str,
        /// Status code.
        status: u16,
    },
    /// Response arrived but has the wrong shape.
    #[error("could not decode response: {0}")]
    Decode(#[from] TraceError),
    /// Background runtime could not be started.
    #[error("fetch runtime unavailable: {0}")]
    Runtime(#[from] std::io::Error),
}
