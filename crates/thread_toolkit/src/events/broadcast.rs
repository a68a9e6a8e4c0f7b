//! src/events/broadcast.rs
//!
//! Typed convenience pair layered over the [`Dispatcher`] for a single
//! payload type: a [`Sender`] that fans a value out to every registered
//! listener, and a [`Receiver`] that ties a listener's registration to its
//! own lifetime.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use super::dispatcher::{Dispatcher, Listener, Subscription};

/// Broadcasts values of one payload type through a dispatcher.
///
/// `notify_all` delivers synchronously, on the calling thread, to every
/// listener registered for `E` at that instant.
pub struct Sender<E> {
    dispatcher: Arc<Dispatcher>,
    _payload: PhantomData<fn(&E)>,
}

impl<E: Send + Sync + 'static> Sender<E> {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            _payload: PhantomData,
        }
    }

    /// Wraps `value` into an `E` event and dispatches it to all currently
    /// registered listeners of that type.
    pub fn notify_all(&self, value: E) {
        self.dispatcher.dispatch(&value);
    }
}

impl<E> Clone for Sender<E> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            _payload: PhantomData,
        }
    }
}

/// Adapts a closure into a [`Listener`].
pub struct FnListener<E, F> {
    callback: F,
    _payload: PhantomData<fn(&E)>,
}

impl<E, F: Fn(&E) + Send + Sync> FnListener<E, F> {
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _payload: PhantomData,
        }
    }
}

impl<E: Send + Sync, F: Fn(&E) + Send + Sync> Listener<E> for FnListener<E, F> {
    fn on_event(&self, event: &E) {
        (self.callback)(event);
    }
}

/// Owns a listener and its registration for payload type `E`.
///
/// Registers at construction and unregisters when dropped, so the listener
/// can never be invoked after the receiver is gone. The dispatcher is a
/// required constructor argument; there is no unregistered half-built state.
pub struct Receiver<E> {
    // Keeps the listener alive for as long as the registration exists; the
    // dispatcher itself only holds a weak reference.
    _listener: Arc<dyn Any + Send + Sync>,
    _subscription: Subscription,
    _payload: PhantomData<fn(&E)>,
}

impl<E: Send + Sync + 'static> Receiver<E> {
    /// Registers `listener` with `dispatcher` for events of type `E`.
    pub fn new<L>(dispatcher: &Arc<Dispatcher>, listener: Arc<L>) -> Self
    where
        L: Listener<E> + 'static,
    {
        let subscription = dispatcher.register::<E, L>(&listener);
        Self {
            _listener: listener,
            _subscription: subscription,
            _payload: PhantomData,
        }
    }

    /// Shorthand for registering a closure as the listener.
    pub fn from_fn<F>(dispatcher: &Arc<Dispatcher>, callback: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self::new(dispatcher, Arc::new(FnListener::new(callback)))
    }
}
