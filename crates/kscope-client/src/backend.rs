// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transport capability consumed by the viewer and CLI.

use std::future::Future;

use kscope_trace::{BlockCatalog, BlockCoord, InterestingLines, ResolvedTrace, SourceIndex, Trace};
use serde_json::Value;
use tracing::info;

use crate::error::TransportError;

/// Kernel source endpoint.
pub const SOURCE_PATH: &str = "/get_src";
/// Trace endpoint; POST `{x, y, z}`.
pub const TRACE_PATH: &str = "/process_blocks";
/// Block catalog endpoint.
pub const CATALOG_PATH: &str = "/api/data";

/// Fetches raw payloads from a trace server.
pub trait TraceBackend: Send + Sync + 'static {
    /// Kernel source as plain text.
    fn fetch_source(&self) -> impl Future<Output = Result<String, TransportError>> + Send;
    /// Raw `/process_blocks` body for `block`.
    fn fetch_trace(
        &self,
        block: BlockCoord,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
    /// Raw `/api/data` body.
    fn fetch_catalog(&self) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Everything needed to replay one block.
#[derive(Debug, Clone)]
pub struct BlockData {
    /// Which block this is.
    pub block: BlockCoord,
    /// Trace resolved against the kernel source.
    pub trace: ResolvedTrace,
}

impl BlockData {
    /// Lines the cursor may visit.
    pub fn interesting_lines(&self) -> InterestingLines {
        self.trace.interesting_lines()
    }
}

/// Fetch source and trace for `block` concurrently and decode both.
pub async fn load_block<B: TraceBackend>(
    backend: &B,
    block: BlockCoord,
) -> Result<BlockData, TransportError> {
    let (text, body) = tokio::try_join!(backend.fetch_source(), backend.fetch_trace(block))?;
    let source = SourceIndex::from_text(&text);
    let trace = Trace::from_response(&body)?;
    let stats = trace.stats();
    let trace = ResolvedTrace::new(trace, source);
    info!(
        %block,
        events = trace.trace().len(),
        lines = trace.source().len(),
        unresolved = trace.unresolved_count(),
        skipped_events = stats.skipped_events,
        skipped_updates = stats.skipped_updates,
        "block loaded"
    );
    Ok(BlockData { block, trace })
}

/// Fetch and decode the block catalog.
pub async fn load_catalog<B: TraceBackend>(backend: &B) -> Result<BlockCatalog, TransportError> {
    let body = backend.fetch_catalog().await?;
    let catalog = BlockCatalog::from_json(&body)?;
    info!(blocks = catalog.len(), extents = ?catalog.extents(), "catalog loaded");
    Ok(catalog)
}
