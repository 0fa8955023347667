//! Message identifiers and their per-connection allocator.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Protocol message identifier.
///
/// Wraps `i32` so ids are not confused with counters or result codes. Valid
/// ids for requests are `1..=i32::MAX`; `0` is reserved for unsolicited
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(i32);

impl MessageId {
    #[inline]
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<i32> for MessageId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<MessageId> for i32 {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Hands out message ids for one connection.
///
/// Ids increase monotonically from 1. After `i32::MAX` the sequence wraps back
/// to 1; the engine skips any wrapped id that is still pending, so wraparound
/// never produces a duplicate among in-flight operations.
#[derive(Debug)]
pub struct MessageIdAllocator {
    next: AtomicI32,
}

impl MessageIdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start the sequence at `first` (values below 1 start at 1).
    pub fn starting_at(first: i32) -> Self {
        Self {
            next: AtomicI32::new(first.max(1)),
        }
    }

    /// Return the next id in the sequence.
    pub fn next_id(&self) -> MessageId {
        let previous = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(if current == i32::MAX { 1 } else { current + 1 })
            })
            .unwrap_or_else(|current| current);
        MessageId(previous)
    }
}

impl Default for MessageIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
