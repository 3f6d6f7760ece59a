// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port traits keeping the frame loop independent of the transport.

use kscope_client::{BlockSession, SessionUpdate, TraceBackend};
use kscope_trace::BlockCoord;

/// Block-fetch port: start/stop block scopes and drain results.
pub trait BlockPort {
    fn select_block(&mut self, block: BlockCoord);
    fn deselect(&mut self);
    fn request_catalog(&mut self);
    fn drain_updates(&mut self, max: usize) -> Vec<SessionUpdate>;
}

impl<B: TraceBackend> BlockPort for BlockSession<B> {
    fn select_block(&mut self, block: BlockCoord) {
        Self::select_block(self, block);
    }

    fn deselect(&mut self) {
        Self::deselect(self);
    }

    fn request_catalog(&mut self) {
        Self::request_catalog(self);
    }

    fn drain_updates(&mut self, max: usize) -> Vec<SessionUpdate> {
        self.drain(max)
    }
}
