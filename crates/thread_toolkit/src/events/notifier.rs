//! src/events/notifier.rs
//!
//! Direct observer fan-out without type-identifier indirection.
//!
//! [`Notifier`] keeps a set of listeners of one trait type `L` and invokes a
//! caller-supplied callback on each of them. It is the simpler precursor of
//! the [`Dispatcher`](super::Dispatcher): no payload typing, no routing —
//! just "call this method on everyone registered".
//!
//! Listeners are held weakly; ones dropped by their owners are skipped and
//! pruned at the next notification. Callbacks run after the internal lock is
//! released, so a listener may add or remove listeners from within its own
//! callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Opaque handle identifying one registration in a [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// A thread-safe set of weakly-held listeners with callback fan-out.
pub struct Notifier<L: ?Sized> {
    listeners: Mutex<Vec<(u64, Weak<L>)>>,
    next_id: AtomicU64,
}

impl<L: ?Sized> Notifier<L> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Adds a listener and returns its registration handle.
    ///
    /// Adding the same listener twice is a no-op returning the existing
    /// handle (set semantics).
    pub fn add_listener(&self, listener: &Arc<L>) -> ListenerId {
        let weak = Arc::downgrade(listener);
        let mut listeners = lock(&self.listeners);
        if let Some((id, _)) = listeners.iter().find(|(_, held)| held.ptr_eq(&weak)) {
            return ListenerId(*id);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        listeners.push((id, weak));
        ListenerId(id)
    }

    /// Removes a registration. Removing one that is absent is a no-op.
    pub fn remove_listener(&self, id: ListenerId) {
        lock(&self.listeners).retain(|(held, _)| *held != id.0);
    }

    /// Invokes `callback` on every live registered listener.
    ///
    /// The listener set is snapshotted under the lock and invoked after
    /// releasing it; listeners dropped by their owners are pruned.
    pub fn notify_listeners(&self, callback: impl Fn(&L)) {
        let snapshot: Vec<(u64, Weak<L>)> = lock(&self.listeners).clone();

        let mut dropped = Vec::new();
        for (id, weak) in snapshot {
            match weak.upgrade() {
                Some(listener) => callback(listener.as_ref()),
                None => dropped.push(id),
            }
        }

        if !dropped.is_empty() {
            lock(&self.listeners).retain(|(id, _)| !dropped.contains(id));
        }
    }

    /// Number of registrations still holding a live listener.
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners)
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }
}

impl<L: ?Sized> Default for Notifier<L> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
