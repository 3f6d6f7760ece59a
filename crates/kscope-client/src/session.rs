// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Block-scoped fetch session for the single-threaded viewer loop.
//!
//! Each fetch runs on its own background thread with a current-thread tokio
//! runtime and reports back over an mpsc channel that the frame loop drains
//! without blocking. Results are tagged with the scope generation that was
//! live when the fetch started; selecting another block (or deselecting)
//! bumps the generation, and anything tagged with an older one is dropped when
//! it arrives. In-flight requests are never cancelled, only ignored.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use kscope_trace::{BlockCatalog, BlockCoord};
use tracing::{debug, error, info};

use crate::backend::{load_block, load_catalog, BlockData, TraceBackend};
use crate::error::TransportError;

/// Shared generation counter identifying the live block selection.
#[derive(Debug, Clone, Default)]
pub struct BlockScope(Arc<AtomicU64>);

impl BlockScope {
    /// Fresh scope at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Invalidate everything started so far; returns the new generation.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// True when `generation` is still live.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Result delivered to the frame loop.
#[derive(Debug)]
pub enum SessionUpdate {
    /// Source and trace for the selected block arrived.
    BlockLoaded(Box<BlockData>),
    /// Fetching the selected block failed.
    BlockFailed {
        /// Block that failed.
        block: BlockCoord,
        /// Why.
        error: TransportError,
    },
    /// Catalog fetch finished.
    Catalog(Result<BlockCatalog, TransportError>),
}

#[derive(Debug)]
struct Envelope {
    /// `None` for results not tied to a block selection.
    generation: Option<u64>,
    update: SessionUpdate,
}

/// Runs fetches off the frame loop and filters stale results.
#[derive(Debug)]
pub struct BlockSession<B> {
    backend: Arc<B>,
    scope: BlockScope,
    selected: Option<BlockCoord>,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    discarded: u64,
}

impl<B: TraceBackend> BlockSession<B> {
    /// Session over `backend` with nothing selected.
    pub fn new(backend: B) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend: Arc::new(backend),
            scope: BlockScope::new(),
            selected: None,
            tx,
            rx,
            discarded: 0,
        }
    }

    /// Block currently in scope.
    pub const fn selected(&self) -> Option<BlockCoord> {
        self.selected
    }

    /// Generation handle (shared with workers).
    pub fn scope(&self) -> &BlockScope {
        &self.scope
    }

    /// Stale results dropped so far.
    pub const fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Shared backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Tear down the previous block scope and start fetching `block`.
    pub fn select_block(&mut self, block: BlockCoord) -> u64 {
        let generation = self.scope.bump();
        self.selected = Some(block);
        info!(%block, generation, "fetching block");

        let backend = Arc::clone(&self.backend);
        let scope = self.scope.clone();
        let tx = self.tx.clone();
        let work = async move {
            let update = match load_block(backend.as_ref(), block).await {
                Ok(data) => SessionUpdate::BlockLoaded(Box::new(data)),
                Err(error) => SessionUpdate::BlockFailed { block, error },
            };
            if !scope.is_current(generation) {
                debug!(%block, generation, "block scope ended before fetch finished");
            }
            update
        };
        spawn_fetch(tx, Some(generation), work, move |error| {
            SessionUpdate::BlockFailed { block, error }
        });
        generation
    }

    /// Tear down the current block scope without starting a new one.
    pub fn deselect(&mut self) {
        let generation = self.scope.bump();
        debug!(generation, previous = ?self.selected, "block scope torn down");
        self.selected = None;
    }

    /// Fetch the block catalog in the background.
    pub fn request_catalog(&self) {
        let backend = Arc::clone(&self.backend);
        let work = async move { SessionUpdate::Catalog(load_catalog(backend.as_ref()).await) };
        spawn_fetch(self.tx.clone(), None, work, |error| {
            SessionUpdate::Catalog(Err(error))
        });
    }

    fn accept(&mut self, env: Envelope) -> Option<SessionUpdate> {
        match env.generation {
            Some(g) if !self.scope.is_current(g) => {
                self.discarded += 1;
                debug!(
                    generation = g,
                    live = self.scope.current(),
                    "discarding stale fetch result"
                );
                None
            }
            _ => Some(env.update),
        }
    }

    /// Drain up to `max` live results without blocking.
    pub fn drain(&mut self, max: usize) -> Vec<SessionUpdate> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.rx.try_recv() {
                Ok(env) => out.extend(self.accept(env)),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Block until one live result arrives or `timeout` elapses.
    pub fn wait_for(&mut self, timeout: Duration) -> Option<SessionUpdate> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(env) => {
                    if let Some(update) = self.accept(env) {
                        return Some(update);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

fn spawn_fetch<F, E>(
    tx: Sender<Envelope>,
    generation: Option<u64>,
    work: F,
    on_runtime_error: E,
) where
    F: Future<Output = SessionUpdate> + Send + 'static,
    E: FnOnce(TransportError) -> SessionUpdate + Send + 'static,
{
    thread::spawn(move || {
        let update = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(work),
            Err(err) => {
                error!(error = %err, "could not start fetch runtime");
                on_runtime_error(TransportError::Runtime(err))
            }
        };
        // Receiver gone means the session was dropped; nothing to report to.
        let _ = tx.send(Envelope { generation, update });
    });
}
