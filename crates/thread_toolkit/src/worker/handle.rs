//! src/worker/handle.rs
//!
//! A worker owns at most one live OS thread and runs a caller-supplied unit of
//! work on it, either once or on a fixed period.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► idle ──start()──► running ──stop()──► idle ──start()──► ...
//!                                │
//!                                └─ (Once mode / loop exit) ──► finished,
//!                                   thread reclaimed by the next stop()
//! ```
//!
//! The unit of work is an owned callable, not an overridable method: its
//! lifetime is independent of the worker's, so there is no window where a
//! half-destroyed object can be invoked from the thread.
//!
//! # Stop semantics
//!
//! `stop()` sets a flag under the worker's mutex, wakes the pacing wait, and
//! joins the thread. The one exception is a stop issued from the worker's own
//! thread: a thread cannot join itself, so the handle is dropped (detached)
//! and the runtime reclaims it asynchronously. That path is logged as a
//! warning; prefer stopping workers from their owner. Natural completion is
//! observable through [`Worker::is_finished`], so an external owner can always
//! reclaim the thread with a normal join.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, trace, warn};

use super::config::{RunMode, WorkerConfig};
use crate::error::{CoreError, Result};

type WorkFn = Arc<dyn Fn() + Send + Sync + 'static>;
type Hook = Box<dyn FnMut() + Send>;

/// State shared between the owner and the worker thread.
///
/// `stop` is guarded by the mutex so the pacing wait and the stop request
/// cannot race; `finished` is written exactly once per run, as the thread's
/// last action.
struct Control {
    stop: Mutex<bool>,
    wake: Condvar,
    finished: AtomicBool,
}

/// An object owning one OS thread with an explicit start/stop lifecycle and a
/// pluggable unit of work.
pub struct Worker {
    config: WorkerConfig,
    work: WorkFn,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
    control: Arc<Control>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Creates an idle worker. No thread exists until [`start`](Self::start).
    pub fn new(config: WorkerConfig, work: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            config,
            work: Arc::new(work),
            on_start: None,
            on_stop: None,
            control: Arc::new(Control {
                stop: Mutex::new(false),
                wake: Condvar::new(),
                finished: AtomicBool::new(false),
            }),
            handle: None,
        }
    }

    /// Hook invoked synchronously on the caller's thread at the beginning of
    /// every successful [`start`](Self::start).
    pub fn with_on_start(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Hook invoked synchronously on the caller's thread at the beginning of
    /// every successful [`stop`](Self::stop).
    pub fn with_on_stop(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_stop = Some(Box::new(hook));
        self
    }

    /// Spawns the worker thread.
    ///
    /// Fails with [`CoreError::AlreadyRunning`] (and changes nothing) if a
    /// thread handle is still held from a previous `start`. A worker whose
    /// loop exited naturally must be `stop`ped before it can be restarted.
    ///
    /// [`CoreError::SpawnFailed`] means the OS refused to create the thread;
    /// the toolkit does not retry and callers should treat it as fatal.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            debug!(worker = %self.config.name, "start rejected: thread already live");
            return Err(CoreError::AlreadyRunning);
        }

        if let Some(hook) = self.on_start.as_mut() {
            hook();
        }

        *lock(&self.control.stop) = false;
        self.control.finished.store(false, Ordering::Release);

        let control = Arc::clone(&self.control);
        let work = Arc::clone(&self.work);
        let mode = self.config.mode;
        let period = self.config.period;

        let handle = thread::Builder::new()
            .name(self.config.name.clone())
            .spawn(move || {
                match mode {
                    RunMode::Once => work(),
                    RunMode::Loop => run_paced_loop(&work, period, &control),
                }
                control.finished.store(true, Ordering::Release);
            })
            .map_err(|source| {
                error!(worker = %self.config.name, error = %source, "thread spawn failed");
                CoreError::SpawnFailed { source }
            })?;

        self.handle = Some(handle);
        trace!(worker = %self.config.name, "worker started");
        Ok(())
    }

    /// Requests termination and reclaims the thread.
    ///
    /// Fails with [`CoreError::NotRunning`] if no thread handle is held.
    /// Succeeds even when the loop already exited naturally; in that case the
    /// join returns immediately. When called from the worker's own thread the
    /// handle is detached instead of joined (a thread cannot join itself) and
    /// a warning is logged.
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            debug!(worker = %self.config.name, "stop rejected: worker not running");
            return Err(CoreError::NotRunning);
        };

        if let Some(hook) = self.on_stop.as_mut() {
            hook();
        }

        *lock(&self.control.stop) = true;
        self.control.wake.notify_all();

        if handle.thread().id() == thread::current().id() {
            warn!(
                worker = %self.config.name,
                "stop called from the worker's own thread; detaching instead of joining"
            );
            drop(handle);
        } else if handle.join().is_err() {
            // The unit of work panicked. The pool/worker contract does not
            // propagate task failures; surface it in the log and move on.
            error!(worker = %self.config.name, "worker thread panicked");
        }

        trace!(worker = %self.config.name, "worker stopped");
        Ok(())
    }

    /// True while a started thread exists and its body has not yet returned.
    pub fn is_running(&self) -> bool {
        self.handle.is_some() && !self.control.finished.load(Ordering::Acquire)
    }

    /// True once the thread body ran to completion (naturally or after a stop
    /// request), even before the handle is reclaimed by [`stop`](Self::stop).
    pub fn is_finished(&self) -> bool {
        self.control.finished.load(Ordering::Acquire)
    }

    /// True when the calling thread is this worker's own thread.
    pub fn is_on_thread(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| handle.thread().id() == thread::current().id())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop();
        }
    }
}

/// Runs `work` once per `period` until a stop is requested.
///
/// Pacing is self-correcting: the wait is `period` minus the time the work
/// itself consumed. Work that overruns the period starts its next iteration
/// immediately. The inter-iteration wait is interruptible by `stop`.
fn run_paced_loop(work: &WorkFn, period: std::time::Duration, control: &Control) {
    loop {
        let started = Instant::now();
        work();
        let elapsed = started.elapsed();

        let mut stop = lock(&control.stop);
        if *stop {
            break;
        }
        if elapsed < period {
            let (guard, _timed_out) = control
                .wake
                .wait_timeout_while(stop, period - elapsed, |requested| !*requested)
                .unwrap_or_else(|e| e.into_inner());
            stop = guard;
            if *stop {
                break;
            }
        }
    }
}

/// Locks a mutex, recovering the guard if a previous holder panicked. The
/// protected state is a plain flag, always valid.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
