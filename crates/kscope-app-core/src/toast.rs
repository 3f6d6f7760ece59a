// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Toast queue with TTL and dedupe.
//!
//! Block-scoped toasts are dropped when the user switches blocks so a fetch
//! failure for one block does not linger over the next.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long error toasts stay up by default.
pub const ERROR_TTL: Duration = Duration::from_secs(8);
/// How long info toasts stay up by default.
pub const INFO_TTL: Duration = Duration::from_secs(3);

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Informational note.
    Info,
    /// Something may need attention.
    Warn,
    /// Operation failed.
    Error,
}

/// Lifetime scope of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastScope {
    /// Survives block changes.
    Global,
    /// Tied to the currently selected block.
    Block,
}

/// Identifier for a toast entry.
pub type ToastId = u64;

/// A queued toast.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Stable identifier.
    pub id: ToastId,
    /// Severity.
    pub kind: ToastKind,
    /// Scope.
    pub scope: ToastScope,
    /// Short title line.
    pub title: String,
    /// Optional detail.
    pub body: Option<String>,
    /// Time to live.
    pub ttl: Duration,
    /// When it was (re)posted.
    pub created: Instant,
}

impl Toast {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created)
    }

    fn alive(&self, now: Instant) -> bool {
        self.age(now) < self.ttl
    }
}

/// Render-ready view of a toast.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastRender {
    /// Stable identifier.
    pub id: ToastId,
    /// Severity.
    pub kind: ToastKind,
    /// Short title line.
    pub title: String,
    /// Optional detail.
    pub body: Option<String>,
    /// 1.0 when just posted, approaching 0.0 at expiry.
    pub progress: f32,
}

/// Bounded in-memory toast queue.
#[derive(Debug)]
pub struct ToastService {
    queue: VecDeque<Toast>,
    max: usize,
    dedupe_window: Duration,
    next_id: ToastId,
}

impl Default for ToastService {
    fn default() -> Self {
        Self::new(6)
    }
}

impl ToastService {
    /// Queue holding at most `max` toasts; the oldest is evicted first.
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            dedupe_window: Duration::from_secs(2),
            next_id: 1,
        }
    }

    /// Post a toast. An identical toast posted within the dedupe window is
    /// refreshed instead of duplicated.
    pub fn push(
        &mut self,
        kind: ToastKind,
        scope: ToastScope,
        title: impl Into<String>,
        body: Option<String>,
        ttl: Duration,
        now: Instant,
    ) -> ToastId {
        let title = title.into();
        let window = self.dedupe_window;
        if let Some(existing) = self.queue.iter_mut().find(|t| {
            t.kind == kind
                && t.scope == scope
                && t.title == title
                && t.body == body
                && t.age(now) <= window
        }) {
            existing.created = now;
            existing.ttl = ttl;
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.queue.len() >= self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(Toast {
            id,
            kind,
            scope,
            title,
            body,
            ttl,
            created: now,
        });
        id
    }

    /// Post a block-scoped error with the default TTL.
    pub fn error(&mut self, title: impl Into<String>, body: impl Into<String>, now: Instant) -> ToastId {
        self.push(
            ToastKind::Error,
            ToastScope::Block,
            title,
            Some(body.into()),
            ERROR_TTL,
            now,
        )
    }

    /// Post a global info note with the default TTL.
    pub fn info(&mut self, title: impl Into<String>, now: Instant) -> ToastId {
        self.push(ToastKind::Info, ToastScope::Global, title, None, INFO_TTL, now)
    }

    /// Drop every toast in `scope`.
    pub fn clear_scope(&mut self, scope: ToastScope) {
        self.queue.retain(|t| t.scope != scope);
    }

    /// Drop expired toasts; call once per frame.
    pub fn retain_visible(&mut self, now: Instant) {
        self.queue.retain(|t| t.alive(now));
    }

    /// Live toasts with progress ratios, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<ToastRender> {
        self.queue
            .iter()
            .filter(|t| t.alive(now))
            .map(|t| ToastRender {
                id: t.id,
                kind: t.kind,
                title: t.title.clone(),
                body: t.body.clone(),
                progress: 1.0 - t.age(now).as_secs_f32() / t.ttl.as_secs_f32().max(f32::EPSILON),
            })
            .collect()
    }

    /// Number of queued toasts, expired or not.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_refresh_instead_of_stacking() {
        let t0 = Instant::now();
        let mut toasts = ToastService::new(4);
        let a = toasts.error("fetch failed", "503", t0);
        let b = toasts.error("fetch failed", "503", t0 + Duration::from_millis(200));
        assert_eq!(a, b);
        assert_eq!(toasts.len(), 1);
        let c = toasts.error("fetch failed", "504", t0);
        assert_ne!(a, c);
    }

    #[test]
    fn expiry_and_progress() {
        let t0 = Instant::now();
        let mut toasts = ToastService::default();
        toasts.info("connected", t0);
        let half = toasts.visible(t0 + INFO_TTL / 2);
        assert_eq!(half.len(), 1);
        assert!((half[0].progress - 0.5).abs() < 0.01);
        toasts.retain_visible(t0 + INFO_TTL);
        assert!(toasts.is_empty());
    }

    #[test]
    fn block_change_clears_block_toasts_only() {
        let t0 = Instant::now();
        let mut toasts = ToastService::default();
        toasts.info("connected", t0);
        toasts.error("block 1,0,0", "timeout", t0);
        toasts.clear_scope(ToastScope::Block);
        let left = toasts.visible(t0);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].kind, ToastKind::Info);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let t0 = Instant::now();
        let mut toasts = ToastService::new(2);
        toasts.info("a", t0);
        toasts.info("b", t0);
        toasts.info("c", t0);
        let titles: Vec<_> = toasts.visible(t0).into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["b", "c"]);
    }
}
