//! # thread_toolkit
//!
//! Reusable OS-thread concurrency primitives for worker-style applications:
//! pipelines that fan units of work out to a fixed set of threads and fan
//! notifications back out to interested parties.
//!
//! ## Architecture Overview
//!
//! ```text
//!   application code
//!        │ submit(task)
//!        ▼
//!  ┌────────────┐   shared    ┌─────────────────────┐
//!  │ WorkerPool │────────────►│ CloseableQueue<Task> │
//!  └─────┬──────┘             └──────────▲───────────┘
//!        │ owns N                        │ try_pop per loop iteration
//!        ▼                               │
//!  ┌────────────┐  one OS thread each    │
//!  │  Worker    │────────────────────────┘
//!  └────────────┘
//!
//!  ┌────────────┐  dispatch by payload TypeId  ┌──────────────┐
//!  │ Dispatcher │─────────────────────────────►│ Listener<E>  │
//!  └────────────┘   (Sender/Receiver on top)   └──────────────┘
//! ```
//!
//! - [`Worker`]: one OS thread, an owned callable, an explicit start/stop
//!   lifecycle, and optional periodic pacing.
//! - [`CloseableQueue`]: thread-safe FIFO whose consumers can be told, exactly
//!   once, that no further items will arrive.
//! - [`WorkerPool`]: N loop-mode workers draining one shared task queue.
//! - [`Dispatcher`] / [`Sender`] / [`Receiver`] / [`Notifier`]: synchronous
//!   typed publish/subscribe and plain observer fan-out.
//!
//! Everything is preemptive `std::thread` based; there is no async runtime,
//! no work-stealing, and no result propagation from submitted tasks.
//! Cancellation is cooperative: stop requests set flags and wake waits, and a
//! unit of work that never returns cannot be preempted.
//!
//! Misuse of lifecycles (double start, submit after shutdown) surfaces as
//! [`CoreError`] codes plus a log line; it never panics or corrupts state.

pub mod error;
pub mod events;
pub mod pool;
pub mod queue;
pub mod worker;

pub use error::{CoreError, Result};
pub use events::{Dispatcher, FnListener, Listener, ListenerId, Notifier, Receiver, Sender, Subscription};
pub use pool::{PoolConfig, Task, WorkerPool};
pub use queue::{CloseableQueue, PopError};
pub use worker::{RunMode, Worker, WorkerConfig, DEFAULT_PERIOD};
