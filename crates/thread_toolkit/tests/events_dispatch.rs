//! Event dispatch tests.
//!
//! Tests cover:
//! - exact-type routing (no cross-type delivery)
//! - unregistration via subscription and receiver drop
//! - Sender/Receiver round-trips, including across threads
//! - Notifier fan-out over trait objects

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use thread_toolkit::{Dispatcher, Listener, Notifier, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
struct BlockDone {
    block: usize,
    checksum: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct PipelineStopped {
    reason: String,
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<BlockDone>>,
}

impl Listener<BlockDone> for Recorder {
    fn on_event(&self, event: &BlockDone) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[test]
fn dispatch_reaches_exact_type_only() {
    let dispatcher = Arc::new(Dispatcher::new());
    let recorder = Arc::new(Recorder::default());
    let _subscription = dispatcher.register::<BlockDone, _>(&recorder);

    dispatcher.dispatch(&BlockDone {
        block: 3,
        checksum: 0xfeed,
    });
    dispatcher.dispatch(&PipelineStopped {
        reason: "unrelated".into(),
    });

    let events = recorder.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].block, 3);
    assert_eq!(events[0].checksum, 0xfeed);
}

#[test]
fn unregistered_listener_is_never_invoked() {
    let dispatcher = Arc::new(Dispatcher::new());
    let recorder = Arc::new(Recorder::default());

    let subscription = dispatcher.register::<BlockDone, _>(&recorder);
    dispatcher.dispatch(&BlockDone {
        block: 1,
        checksum: 1,
    });

    subscription.cancel();
    dispatcher.dispatch(&BlockDone {
        block: 2,
        checksum: 2,
    });

    assert_eq!(recorder.events.lock().unwrap().len(), 1);
}

#[test]
fn sender_receiver_round_trip() {
    let dispatcher = Arc::new(Dispatcher::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    let receiver = Receiver::from_fn(&dispatcher, move |event: &BlockDone| {
        sink.lock().unwrap().push(event.clone());
    });

    let sender = Sender::new(dispatcher.clone());
    sender.notify_all(BlockDone {
        block: 7,
        checksum: 0xabc,
    });

    assert_eq!(
        *seen.lock().unwrap(),
        vec![BlockDone {
            block: 7,
            checksum: 0xabc
        }]
    );

    // Dropping the receiver unregisters it.
    drop(receiver);
    sender.notify_all(BlockDone {
        block: 8,
        checksum: 0xdef,
    });
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn every_registered_receiver_gets_the_event() {
    let dispatcher = Arc::new(Dispatcher::new());
    let first_hits = Arc::new(AtomicUsize::new(0));
    let second_hits = Arc::new(AtomicUsize::new(0));
    let other_hits = Arc::new(AtomicUsize::new(0));

    let hits = first_hits.clone();
    let _first = Receiver::from_fn(&dispatcher, move |_: &BlockDone| {
        hits.fetch_add(1, Ordering::SeqCst);
    });
    let hits = second_hits.clone();
    let _second = Receiver::from_fn(&dispatcher, move |_: &BlockDone| {
        hits.fetch_add(1, Ordering::SeqCst);
    });
    let hits = other_hits.clone();
    let _other = Receiver::from_fn(&dispatcher, move |_: &PipelineStopped| {
        hits.fetch_add(1, Ordering::SeqCst);
    });

    Sender::new(dispatcher.clone()).notify_all(BlockDone {
        block: 0,
        checksum: 0,
    });

    assert_eq!(first_hits.load(Ordering::SeqCst), 1);
    assert_eq!(second_hits.load(Ordering::SeqCst), 1);
    assert_eq!(other_hits.load(Ordering::SeqCst), 0);
}

#[test]
fn dispatch_from_another_thread() -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::new());
    let hits = Arc::new(AtomicUsize::new(0));

    let sink = hits.clone();
    let _receiver = Receiver::from_fn(&dispatcher, move |event: &BlockDone| {
        sink.fetch_add(event.block, Ordering::SeqCst);
    });

    let sender = Sender::new(dispatcher.clone());
    let publisher = thread::spawn(move || {
        for block in 1..=4 {
            sender.notify_all(BlockDone {
                block,
                checksum: block as u64,
            });
        }
    });
    publisher.join().expect("publisher thread panicked");

    assert_eq!(hits.load(Ordering::SeqCst), 1 + 2 + 3 + 4);
    Ok(())
}

#[test]
fn listener_may_dispatch_reentrantly() {
    // The dispatcher releases its lock before invoking listeners, so a
    // listener can publish a follow-up event without deadlocking.
    let dispatcher = Arc::new(Dispatcher::new());
    let stopped = Arc::new(Mutex::new(Vec::new()));

    let sink = stopped.clone();
    let _stop_listener = Receiver::from_fn(&dispatcher, move |event: &PipelineStopped| {
        sink.lock().unwrap().push(event.reason.clone());
    });

    let inner = dispatcher.clone();
    let _block_listener = Receiver::from_fn(&dispatcher, move |event: &BlockDone| {
        inner.dispatch(&PipelineStopped {
            reason: format!("after block {}", event.block),
        });
    });

    dispatcher.dispatch(&BlockDone {
        block: 5,
        checksum: 5,
    });

    assert_eq!(*stopped.lock().unwrap(), vec!["after block 5".to_string()]);
}

// --------------------------------------------------------------------------
// Notifier (direct observer fan-out)
// --------------------------------------------------------------------------

trait ProgressObserver: Send + Sync {
    fn on_progress(&self, percent: u8);
}

struct ProgressProbe {
    last: AtomicUsize,
}

impl ProgressObserver for ProgressProbe {
    fn on_progress(&self, percent: u8) {
        self.last.store(percent as usize, Ordering::SeqCst);
    }
}

#[test]
fn notifier_invokes_trait_object_listeners() {
    let notifier: Notifier<dyn ProgressObserver> = Notifier::new();

    let probe = Arc::new(ProgressProbe {
        last: AtomicUsize::new(0),
    });
    let observer: Arc<dyn ProgressObserver> = probe.clone();
    let id = notifier.add_listener(&observer);

    notifier.notify_listeners(|listener| listener.on_progress(40));
    assert_eq!(probe.last.load(Ordering::SeqCst), 40);

    notifier.remove_listener(id);
    notifier.notify_listeners(|listener| listener.on_progress(90));
    assert_eq!(probe.last.load(Ordering::SeqCst), 40);
}
