//! Typed event dispatch and observer fan-out.
//!
//! Two mechanisms, from richer to simpler:
//!
//! - [`Dispatcher`] + [`Sender`]/[`Receiver`]: events routed by payload type.
//!   Define a payload struct, register listeners for it, and every
//!   `notify_all`/`dispatch` of that type reaches exactly those listeners.
//! - [`Notifier`]: a plain listener set with direct callback invocation, for
//!   observer patterns that do not need per-type routing.
//!
//! Both hold listeners weakly and invoke them outside their internal lock;
//! see the module docs of `dispatcher` and `notifier` for the exact
//! reentrancy and lifetime guarantees.

mod broadcast;
mod dispatcher;
mod notifier;

pub use broadcast::{FnListener, Receiver, Sender};
pub use dispatcher::{Dispatcher, Listener, Subscription};
pub use notifier::{ListenerId, Notifier};
