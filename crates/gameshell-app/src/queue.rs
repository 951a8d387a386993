//! Command buffering while the engine cannot take commands
//!
//! Commands issued before readiness, or while the view is unmounted, wait
//! here in issue order. The queue belongs to a single bridge session.
//!
//! ## Staleness
//!
//! Entries are never expired while they sit in the queue. Staleness is
//! decided only when the queue is drained for a flush: any entry whose age at
//! that moment is strictly greater than the TTL is dropped instead of
//! dispatched. The relative order of the surviving entries is unchanged. A TTL
//! of zero disables the check.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use gameshell_core::Payload;

/// A command waiting for dispatch. Immutable once queued.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    /// Sequence number, unique within the queue's lifetime
    pub id: u64,
    pub name: String,
    pub payload: Option<Payload>,
    pub enqueued_at: Instant,
}

impl PendingCommand {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}

/// Result of [`CommandQueue::push`]
#[derive(Debug)]
pub struct Enqueued {
    pub id: u64,
    /// The oldest entry, evicted to make room
    pub dropped: Option<PendingCommand>,
}

/// Entries drained for a flush, split by the TTL check
#[derive(Debug, Default)]
pub struct FlushBatch {
    /// In FIFO order
    pub fresh: Vec<PendingCommand>,
    pub stale: Vec<PendingCommand>,
}

/// Bounded FIFO of [`PendingCommand`]s
#[derive(Debug)]
pub struct CommandQueue {
    entries: VecDeque<PendingCommand>,
    capacity: usize,
    ttl: Duration,
    next_id: u64,
}

impl CommandQueue {
    /// `capacity` is clamped to at least one entry
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            ttl,
            next_id: 1,
        }
    }

    /// Append a command, evicting the oldest entry when full
    pub fn push(
        &mut self,
        name: impl Into<String>,
        payload: Option<Payload>,
        now: Instant,
    ) -> Enqueued {
        let dropped = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };

        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(PendingCommand {
            id,
            name: name.into(),
            payload,
            enqueued_at: now,
        });

        Enqueued { id, dropped }
    }

    /// Drain every entry, separating stale ones (see module docs)
    pub fn take_batch(&mut self, now: Instant) -> FlushBatch {
        let mut batch = FlushBatch::default();
        for entry in self.entries.drain(..) {
            if self.ttl.is_zero() || entry.age(now) <= self.ttl {
                batch.fresh.push(entry);
            } else {
                batch.stale.push(entry);
            }
        }
        batch
    }

    /// Put undispatched entries back at the head, keeping their order
    pub fn restore_front(&mut self, entries: impl IntoIterator<Item = PendingCommand>) {
        let entries: Vec<_> = entries.into_iter().collect();
        for entry in entries.into_iter().rev() {
            self.entries.push_front(entry);
        }
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Drop everything; returns how many entries were discarded
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingCommand> {
        self.entries.iter()
    }
}
