//! src/events/dispatcher.rs
//!
//! Type-keyed publish/subscribe registry.
//!
//! Events are routed by their payload's [`TypeId`] — a compile-time tag
//! assigned per type by the language, so there is no hashing of runtime type
//! info and no collision risk. A dispatched payload reaches listeners
//! registered for exactly that type, never a partial or structural match.
//!
//! # Ownership
//!
//! The registry never owns listeners. [`Dispatcher::register`] stores a weak
//! reference and returns an opaque [`Subscription`] that unregisters on drop;
//! a listener dropped while still registered is skipped and pruned at the
//! next dispatch. Neither side can dangle regardless of destruction order.
//!
//! # Locking
//!
//! `dispatch` snapshots the matching listeners under the registry lock and
//! invokes them only after releasing it. Listener code may therefore
//! register, unregister, or dispatch again without deadlocking. The flip side
//! is a small window: a listener registered (or unregistered) concurrently
//! with an in-flight dispatch may or may not see that particular event.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

/// The capability to accept events of one payload type.
pub trait Listener<E>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// Invokes a weakly-held listener with a type-erased payload.
/// Returns `false` once the listener has been dropped.
type ErasedHandler = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> bool + Send + Sync>;

struct Entry {
    id: u64,
    handler: ErasedHandler,
}

/// A thread-safe registry routing typed events to all currently registered
/// listeners of that exact payload type.
///
/// Wrap it in an [`Arc`]; registration hands out [`Subscription`]s that hold
/// a weak reference back to it.
pub struct Dispatcher {
    registry: Mutex<HashMap<TypeId, Vec<Entry>>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers `listener` for events of payload type `E`.
    ///
    /// The registry keeps only a weak reference; the caller retains ownership
    /// of the listener. The returned [`Subscription`] unregisters on drop.
    pub fn register<E, L>(self: &Arc<Self>, listener: &Arc<L>) -> Subscription
    where
        E: Send + Sync + 'static,
        L: Listener<E> + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let weak = Arc::downgrade(listener);
        let handler: ErasedHandler = Arc::new(move |payload| {
            let Some(listener) = weak.upgrade() else {
                return false;
            };
            if let Some(event) = payload.downcast_ref::<E>() {
                listener.on_event(event);
            }
            true
        });

        let key = TypeId::of::<E>();
        lock(&self.registry).entry(key).or_default().push(Entry { id, handler });

        Subscription {
            key,
            id,
            dispatcher: Arc::downgrade(self),
        }
    }

    /// Delivers `event` to every listener registered for `E` at the instant
    /// of dispatch. Invocation happens synchronously on the caller's thread,
    /// after the registry lock has been released.
    pub fn dispatch<E: Send + Sync + 'static>(&self, event: &E) {
        let snapshot: Vec<(u64, ErasedHandler)> = {
            let registry = lock(&self.registry);
            match registry.get(&TypeId::of::<E>()) {
                Some(entries) => entries
                    .iter()
                    .map(|entry| (entry.id, Arc::clone(&entry.handler)))
                    .collect(),
                None => return,
            }
        };

        let mut dropped = Vec::new();
        for (id, handler) in snapshot {
            if !handler(event) {
                dropped.push(id);
            }
        }

        if !dropped.is_empty() {
            trace!(count = dropped.len(), "pruning dropped listeners");
            let key = TypeId::of::<E>();
            let mut registry = lock(&self.registry);
            if let Some(entries) = registry.get_mut(&key) {
                entries.retain(|entry| !dropped.contains(&entry.id));
                if entries.is_empty() {
                    registry.remove(&key);
                }
            }
        }
    }

    /// Number of registrations currently held for payload type `E`,
    /// including listeners that were dropped but not yet pruned.
    pub fn listener_count<E: 'static>(&self) -> usize {
        lock(&self.registry)
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    fn unregister(&self, key: TypeId, id: u64) {
        let mut registry = lock(&self.registry);
        // Unregistering something no longer present is a no-op.
        if let Some(entries) = registry.get_mut(&key) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                registry.remove(&key);
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque registration handle. Dropping it (or calling
/// [`cancel`](Subscription::cancel)) removes the listener from the registry;
/// if the dispatcher is already gone, dropping is a no-op.
pub struct Subscription {
    key: TypeId,
    id: u64,
    dispatcher: Weak<Dispatcher>,
}

impl Subscription {
    /// Unregisters explicitly instead of waiting for drop.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.unregister(self.key, self.id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
