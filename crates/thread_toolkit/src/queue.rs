//! src/queue.rs
//!
//! A thread-safe FIFO queue whose consumers can be told, exactly once, that no
//! further items will arrive.
//!
//! `CloseableQueue` is the hand-off point between task producers and the pool
//! workers that drain them. It is unbounded: `push` never blocks, so there is
//! no backpressure; memory is the only limit.
//!
//! # Close semantics
//!
//! `close()` is one-way and idempotent. After it:
//! - `push` silently drops its item (the caller can check `is_closed()` first
//!   if it needs a delivery guarantee),
//! - pops continue to drain whatever is already queued,
//! - once drained, blocking pops return [`PopError::Closed`] instead of
//!   waiting forever.
//!
//! This mirrors the disconnect behaviour of the `crossbeam_channel` receivers
//! used elsewhere in the test suite: remaining elements stay receivable, only
//! the "forever empty" state is reported as an error.
//!
//! # Ordering
//!
//! Strict FIFO per queue: elements are popped in push order under a single
//! mutex. Across multiple concurrent poppers the only guarantee is that each
//! element is delivered to exactly one of them, at most once.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

/// Reasons a pop did not return an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// Non-blocking pop found the queue empty (and still open).
    Empty,
    /// The queue is closed and fully drained; no element will ever arrive.
    Closed,
    /// A timed pop elapsed before an element arrived.
    Timeout {
        /// The wait bound that was exceeded.
        timeout: Duration,
    },
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded thread-safe FIFO with a one-way close transition.
pub struct CloseableQueue<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

impl<T> CloseableQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends an element and wakes one waiting popper.
    ///
    /// If the queue is closed the element is silently dropped; this is a
    /// deliberate part of the contract, not an error. Producers that need a
    /// delivery guarantee must coordinate with whoever calls `close`.
    pub fn push(&self, item: T) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.closed {
            debug!("push on closed queue, element dropped");
            return;
        }
        inner.items.push_back(item);
        drop(inner);
        self.available.notify_one();
    }

    /// Blocks until an element is available or the queue is closed and drained.
    pub fn pop(&self) -> Result<T, PopError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Ok(item);
            }
            if inner.closed {
                return Err(PopError::Closed);
            }
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Like [`pop`](Self::pop), but gives up after `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<T, PopError> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Ok(item);
            }
            if inner.closed {
                return Err(PopError::Closed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(PopError::Timeout { timeout });
            }
            let (guard, _result) = self
                .available
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            inner = guard;
        }
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Result<T, PopError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.items.pop_front() {
            Some(item) => Ok(item),
            None if inner.closed => Err(PopError::Closed),
            None => Err(PopError::Empty),
        }
    }

    /// Marks the queue closed and wakes every waiter. Idempotent.
    ///
    /// Elements already queued remain poppable; only the empty+closed state
    /// reports [`PopError::Closed`].
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.closed {
            return;
        }
        inner.closed = true;
        drop(inner);
        self.available.notify_all();
    }

    /// Point-in-time emptiness snapshot. Not a synchronization primitive:
    /// another thread may push or pop before the caller acts on the answer.
    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .items
            .is_empty()
    }

    /// Point-in-time closed snapshot.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).closed
    }

    /// Point-in-time element count.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .items
            .len()
    }
}

impl<T> Default for CloseableQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
