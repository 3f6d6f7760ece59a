// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Two-lane frame scheduler.
//!
//! Input goes on the urgent lane and is always drained in full first.
//! Expensive follow-up work (hover publication, snapshot recomputation) goes on
//! the deferred lane, keyed so that only the latest update per key survives,
//! and is drained up to a per-frame budget once no urgent work is pending.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use tracing::{debug, trace};

/// Work taken for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameWork<U, D> {
    /// Urgent items in arrival order.
    pub urgent: Vec<U>,
    /// Deferred items in first-enqueue order of their keys.
    pub deferred: Vec<D>,
}

impl<U, D> FrameWork<U, D> {
    /// True when the frame has nothing to do.
    pub fn is_empty(&self) -> bool {
        self.urgent.is_empty() && self.deferred.is_empty()
    }
}

/// Urgent FIFO plus a coalescing deferred lane.
#[derive(Debug)]
pub struct UpdateQueue<K, U, D> {
    urgent: VecDeque<U>,
    order: VecDeque<K>,
    deferred: HashMap<K, D>,
    frame: u64,
    coalesced: u64,
}

impl<K, U, D> Default for UpdateQueue<K, U, D> {
    fn default() -> Self {
        Self {
            urgent: VecDeque::new(),
            order: VecDeque::new(),
            deferred: HashMap::new(),
            frame: 0,
            coalesced: 0,
        }
    }
}

impl<K, U, D> UpdateQueue<K, U, D>
where
    K: Eq + Hash + Clone,
{
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an input-driven item.
    pub fn push_urgent(&mut self, item: U) {
        self.urgent.push_back(item);
    }

    /// Queue deferred work under `key`, replacing any pending item with the
    /// same key. Returns `true` when an older item was replaced.
    pub fn push_deferred(&mut self, key: K, item: D) -> bool {
        if let Some(slot) = self.deferred.get_mut(&key) {
            *slot = item;
            self.coalesced += 1;
            return true;
        }
        self.order.push_back(key.clone());
        self.deferred.insert(key, item);
        false
    }

    /// Drop pending deferred work for `key`.
    pub fn cancel_deferred(&mut self, key: &K) -> Option<D> {
        let item = self.deferred.remove(key)?;
        self.order.retain(|k| k != key);
        Some(item)
    }

    /// Take every urgent item.
    pub fn take_urgent(&mut self) -> Vec<U> {
        self.urgent.drain(..).collect()
    }

    /// Take up to `budget` deferred items, or nothing while urgent work is
    /// pending.
    pub fn take_deferred(&mut self, budget: usize) -> Vec<D> {
        if !self.urgent.is_empty() {
            trace!(urgent = self.urgent.len(), "deferring background work behind input");
            return Vec::new();
        }
        let mut out = Vec::with_capacity(budget.min(self.order.len()));
        while out.len() < budget {
            let Some(key) = self.order.pop_front() else {
                break;
            };
            if let Some(item) = self.deferred.remove(&key) {
                out.push(item);
            }
        }
        out
    }

    /// Drain one frame: all urgent work, then deferred work within `budget`.
    pub fn next_frame(&mut self, budget: usize) -> FrameWork<U, D> {
        self.frame += 1;
        let urgent = self.take_urgent();
        let deferred = self.take_deferred(budget);
        if !self.order.is_empty() {
            debug!(
                frame = self.frame,
                backlog = self.order.len(),
                coalesced = self.coalesced,
                "deferred work carried to next frame"
            );
        }
        FrameWork { urgent, deferred }
    }

    /// Pending urgent items.
    pub fn pending_urgent(&self) -> usize {
        self.urgent.len()
    }

    /// Pending deferred keys.
    pub fn pending_deferred(&self) -> usize {
        self.order.len()
    }

    /// True when both lanes are empty.
    pub fn is_idle(&self) -> bool {
        self.urgent.is_empty() && self.order.is_empty()
    }

    /// Frames drained so far.
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Deferred items replaced before they ran.
    pub const fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
