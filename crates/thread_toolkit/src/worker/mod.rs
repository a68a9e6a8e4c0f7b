//! Controllable worker threads.
//!
//! A [`Worker`] owns one OS thread and runs a caller-supplied callable either
//! exactly once ([`RunMode::Once`]) or repeatedly on a fixed period
//! ([`RunMode::Loop`]) until stopped. Lifecycle misuse (double start, stop
//! before start) is reported through [`CoreError`](crate::CoreError) codes,
//! never a panic.
//!
//! Module layout:
//! - `config`: [`WorkerConfig`] and its builder
//! - `handle`: the [`Worker`] itself (thread ownership, pacing loop, stop
//!   protocol)

mod config;
mod handle;

pub use config::{RunMode, WorkerConfig, WorkerConfigBuilder, DEFAULT_PERIOD};
pub use handle::Worker;
