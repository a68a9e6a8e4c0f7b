//! src/pool.rs
//!
//! A fixed-size pool of [`Worker`]s sharing one closeable task queue.
//!
//! # Architecture
//!
//! ```text
//!  submit(task) ──► CloseableQueue<Task> ◄──try_pop── worker "<prefix>_0"
//!                          ▲          ◄──try_pop── worker "<prefix>_1"
//!                          │          ◄──try_pop── worker "<prefix>_N"
//!                     close() on shutdown
//! ```
//!
//! Each worker runs in [`RunMode::Loop`]: pop one task per iteration, execute
//! it if present, otherwise yield and retry next period. The queue is
//! unbounded, so `submit` never blocks and there is no backpressure.
//!
//! # Shutdown
//!
//! [`WorkerPool::shutdown`] (also run on drop) sets the shutdown flag, closes
//! the queue, and joins every worker. Tasks still queued at that point are
//! dropped without being executed or reported. Callers that need all
//! submitted work to run must call [`WorkerPool::wait_idle`] first.
//!
//! The flag is checked by `submit` before enqueueing, outside the queue lock:
//! a submit racing a concurrent shutdown may still enqueue a task that is
//! never run. That window is part of the contract.
//!
//! Task failures are invisible to the pool: a task that panics kills one
//! iteration of one worker's loop (logged at join time), and tasks have no
//! result channel. Anything a caller wants back must travel through state the
//! task itself owns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{CoreError, Result};
use crate::queue::CloseableQueue;
use crate::worker::{RunMode, Worker, WorkerConfig, DEFAULT_PERIOD};

/// A unit of work accepted by [`WorkerPool::submit`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// How often [`WorkerPool::wait_idle`] re-checks the queue.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads. Defaults to the host's available
    /// parallelism.
    pub worker_count: usize,
    /// Thread-name prefix; workers are named `<prefix>_<index>`.
    pub name_prefix: String,
    /// Per-worker loop period (see [`WorkerConfig::period`]).
    pub period: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1),
            name_prefix: "worker".to_string(),
            period: DEFAULT_PERIOD,
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

/// Builder for [`PoolConfig`] with method chaining.
#[derive(Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Set the number of worker threads (must be > 0).
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    /// Set the thread-name prefix.
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.name_prefix = prefix.into();
        self
    }

    /// Set the per-worker loop period.
    ///
    /// - Too low: more wake-ups while the pool is idle.
    /// - Too high: an idle worker reacts slowly to new submissions.
    pub fn period(mut self, period: Duration) -> Self {
        self.config.period = period;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> PoolConfig {
        self.config
    }
}

/// A fixed set of workers implementing a producer/consumer work-distribution
/// pattern over one shared queue.
pub struct WorkerPool {
    workers: Vec<Worker>,
    queue: Arc<CloseableQueue<Task>>,
    shutdown: AtomicBool,
}

impl WorkerPool {
    /// Creates the pool and starts every worker.
    ///
    /// Returns `Err` if `worker_count` is zero or a thread could not be
    /// spawned. Workers already started when a spawn fails are stopped by the
    /// pool's drop.
    pub fn new(config: PoolConfig) -> Result<Self> {
        if config.worker_count == 0 {
            return Err(CoreError::Undefined(
                "cannot create a pool with 0 workers".to_string(),
            ));
        }

        let queue = Arc::new(CloseableQueue::<Task>::new());
        let mut workers = Vec::with_capacity(config.worker_count);

        for index in 0..config.worker_count {
            let worker_config = WorkerConfig::builder()
                .name(format!("{}_{}", config.name_prefix, index))
                .mode(RunMode::Loop)
                .period(config.period)
                .build();

            let queue = Arc::clone(&queue);
            let mut worker = Worker::new(worker_config, move || {
                match queue.try_pop() {
                    Ok(task) => task(),
                    // Empty or closed: give the CPU away and let the loop
                    // pacing decide when to look again.
                    Err(_) => thread::yield_now(),
                }
            });
            worker.start()?;
            workers.push(worker);
        }

        debug!(
            workers = config.worker_count,
            prefix = %config.name_prefix,
            "worker pool started"
        );

        Ok(Self {
            workers,
            queue,
            shutdown: AtomicBool::new(false),
        })
    }

    /// Enqueues a task for execution by some worker.
    ///
    /// Never blocks. Fails with [`CoreError::ShuttingDown`] once shutdown has
    /// begun. The pool guarantees the task will be invoked provided the queue
    /// drains before shutdown; it observes neither results nor failures.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> Result<()> {
        if self.shutdown.load(Ordering::SeqCst) {
            debug!("submit rejected: pool is shutting down");
            return Err(CoreError::ShuttingDown);
        }
        self.queue.push(Box::new(task));
        Ok(())
    }

    /// Blocks until the task queue is empty or `timeout` elapses.
    ///
    /// An empty queue means every submitted task has been picked up; tasks
    /// already picked up finish their current iteration before the workers
    /// join, so `wait_idle` followed by drop runs everything submitted so
    /// far. Concurrent submitters can keep the queue non-empty indefinitely.
    pub fn wait_idle(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while !self.queue.is_empty() {
            if Instant::now() >= deadline {
                return Err(CoreError::Timeout { timeout });
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
        Ok(())
    }

    /// Number of worker threads owned by the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of tasks currently queued (snapshot).
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// True once shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Stops accepting tasks, closes the queue, and joins every worker.
    /// Idempotent. Tasks still queued are dropped silently.
    pub fn shutdown(&mut self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            trace!(pending = self.queue.len(), "worker pool shutting down");
        }
        self.queue.close();
        for worker in &mut self.workers {
            // NotRunning here just means a previous shutdown already
            // reclaimed the thread.
            let _ = worker.stop();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
