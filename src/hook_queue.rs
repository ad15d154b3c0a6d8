//! # Hook Queue
//!
//! A FIFO of terminal hooks supporting the "append then try-remove"
//! late-registration protocol: a registrant always appends
//! its hook, then — only if the lifecycle has already reached a terminal
//! state — attempts to reclaim that exact entry. If reclamation succeeds,
//! nobody else has touched it yet and the registrant runs it itself. If it
//! fails, the completer already popped it and owns running it. Either way
//! the hook fires exactly once.
//!
//! A lock-free MPMC queue such as `crossbeam::queue::SegQueue` supports
//! push/pop but not "remove this specific entry", which the reclaim step
//! needs, so this is a small mutex-guarded deque with id-addressed removal
//! instead. The mutex is only ever held for the synchronous push/pop/remove
//! call, never across an `.await`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug)]
pub struct HookQueue<H> {
    next_id: AtomicU64,
    items: Mutex<VecDeque<(u64, H)>>,
}

impl<H> HookQueue<H> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Append a hook, returning the id it can later be reclaimed by.
    pub fn push(&self, hook: H) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.items.lock().unwrap().push_back((id, hook));
        id
    }

    /// Attempt to reclaim the hook registered under `id`. Returns `Some` iff
    /// it was still present in the queue (i.e. the completer had not yet
    /// popped it).
    pub fn try_claim(&self, id: u64) -> Option<H> {
        let mut items = self.items.lock().unwrap();
        let position = items.iter().position(|(item_id, _)| *item_id == id)?;
        items.remove(position).map(|(_, hook)| hook)
    }

    /// Pop the oldest remaining hook, if any.
    pub fn pop(&self) -> Option<H> {
        self.items.lock().unwrap().pop_front().map(|(_, hook)| hook)
    }
}

impl<H> Default for HookQueue<H> {
    fn default() -> Self {
        Self::new()
    }
}
