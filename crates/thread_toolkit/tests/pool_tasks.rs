//! Worker pool tests.
//!
//! Tests cover:
//! - exactly-once execution of submitted tasks across workers
//! - shutdown flag behaviour and submit rejection
//! - wait_idle as the drain precondition before destruction
//! - a small redundant block-checksum pipeline as an end-to-end consumer

use anyhow::Result;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thread_toolkit::{CoreError, PoolConfig, WorkerPool};

fn fast_pool(workers: usize) -> Result<WorkerPool> {
    let config = PoolConfig::builder()
        .worker_count(workers)
        .name_prefix("test_pool")
        .period(Duration::from_millis(1))
        .build();
    Ok(WorkerPool::new(config)?)
}

#[test]
fn every_task_is_invoked_exactly_once() -> Result<()> {
    const TASKS: usize = 100;

    let pool = fast_pool(4)?;
    let (seen_tx, seen_rx) = crossbeam_channel::unbounded();

    for index in 0..TASKS {
        let seen_tx = seen_tx.clone();
        pool.submit(move || {
            seen_tx.send(index).unwrap();
        })?;
    }
    drop(seen_tx);

    // Required precondition: let the queue drain before destroying the pool.
    pool.wait_idle(Duration::from_secs(10))?;
    drop(pool); // joins workers, so in-flight tasks have finished

    let seen: Vec<usize> = seen_rx.iter().collect();
    assert_eq!(seen.len(), TASKS, "duplicate or lost invocation");
    let distinct: HashSet<usize> = seen.iter().copied().collect();
    assert_eq!(distinct.len(), TASKS);
    Ok(())
}

#[test]
fn workers_share_the_load() -> Result<()> {
    const TASKS: usize = 64;

    let pool = fast_pool(4)?;
    let (name_tx, name_rx) = crossbeam_channel::unbounded();

    for _ in 0..TASKS {
        let name_tx = name_tx.clone();
        pool.submit(move || {
            let name = std::thread::current().name().unwrap_or("?").to_string();
            // One task per loop iteration gives every worker a chance.
            std::thread::sleep(Duration::from_millis(1));
            name_tx.send(name).unwrap();
        })?;
    }
    drop(name_tx);

    pool.wait_idle(Duration::from_secs(10))?;
    drop(pool);

    let names: HashSet<String> = name_rx.iter().collect();
    assert!(
        names.len() > 1,
        "expected more than one worker to run tasks, saw {names:?}"
    );
    assert!(names.iter().all(|name| name.starts_with("test_pool_")));
    Ok(())
}

#[test]
fn submit_after_shutdown_is_rejected() -> Result<()> {
    let mut pool = fast_pool(2)?;
    assert!(!pool.is_shutting_down());

    pool.shutdown();
    assert!(pool.is_shutting_down());
    assert!(matches!(
        pool.submit(|| {}),
        Err(CoreError::ShuttingDown)
    ));

    // Shutdown is idempotent.
    pool.shutdown();
    Ok(())
}

#[test]
fn tasks_left_at_shutdown_are_dropped_silently() -> Result<()> {
    let executed = Arc::new(AtomicUsize::new(0));

    // A period this long means no worker iteration picks up work before the
    // pool is torn down.
    let config = PoolConfig::builder()
        .worker_count(1)
        .name_prefix("sluggish")
        .period(Duration::from_secs(3600))
        .build();
    let pool = WorkerPool::new(config)?;

    // Let the worker's first (empty-queue) iteration pass before submitting,
    // so it is parked in its pacing wait.
    std::thread::sleep(Duration::from_millis(100));

    for _ in 0..10 {
        let executed = executed.clone();
        pool.submit(move || {
            executed.fetch_add(1, Ordering::SeqCst);
        })?;
    }

    assert!(matches!(
        pool.wait_idle(Duration::from_millis(20)),
        Err(CoreError::Timeout { .. })
    ));

    drop(pool);
    assert_eq!(executed.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn worker_count_and_pending_snapshots() -> Result<()> {
    let pool = fast_pool(3)?;
    assert_eq!(pool.worker_count(), 3);
    pool.wait_idle(Duration::from_secs(5))?;
    assert_eq!(pool.pending_tasks(), 0);
    Ok(())
}

/// End-to-end consumer in the shape this toolkit was built for: checksum a
/// set of data blocks redundantly and verify that independent computations
/// agree.
#[test]
fn redundant_block_checksum_pipeline() -> Result<()> {
    const BLOCKS: usize = 32;
    const REDUNDANCY: usize = 2;

    fn checksum(block: &[u8]) -> u64 {
        // Simple FNV-1a; the pipeline cares about agreement, not strength.
        block.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }

    let blocks: Arc<Vec<Vec<u8>>> = Arc::new(
        (0..BLOCKS)
            .map(|index| (0..512).map(|offset| ((index * 31 + offset) % 256) as u8).collect())
            .collect(),
    );

    let pool = fast_pool(4)?;
    let (result_tx, result_rx) = crossbeam_channel::unbounded();

    for block_index in 0..BLOCKS {
        for _ in 0..REDUNDANCY {
            let blocks = blocks.clone();
            let result_tx = result_tx.clone();
            pool.submit(move || {
                let digest = checksum(&blocks[block_index]);
                result_tx.send((block_index, digest)).unwrap();
            })?;
        }
    }
    drop(result_tx);

    pool.wait_idle(Duration::from_secs(10))?;
    drop(pool);

    let mut digests: Vec<Vec<u64>> = vec![Vec::new(); BLOCKS];
    for (block_index, digest) in result_rx.iter() {
        digests[block_index].push(digest);
    }

    for (block_index, block_digests) in digests.iter().enumerate() {
        assert_eq!(
            block_digests.len(),
            REDUNDANCY,
            "block {block_index} missing a redundant computation"
        );
        assert!(
            block_digests.windows(2).all(|pair| pair[0] == pair[1]),
            "redundant checksums disagree for block {block_index}"
        );
    }
    Ok(())
}
