//! Cross-thread handoff between background writers and the UI thread.

use std::cell::RefCell;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use horizon_listsync_core::{PropertyStore, SignalError, UiTaskQueue};

#[test]
fn test_background_writers_post_and_ui_applies_in_order() {
    let queue = UiTaskQueue::<RefCell<Vec<(usize, usize)>>>::new();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let sender = queue.sender();
            thread::spawn(move || {
                for n in 0..25 {
                    sender
                        .post(move |log: &RefCell<Vec<(usize, usize)>>| log.borrow_mut().push((worker, n)))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let log = RefCell::new(Vec::new());
    assert_eq!(queue.pending_count(), 100);
    assert_eq!(queue.process_batch(&log), 10);
    assert_eq!(queue.process_all(&log), 90);
    assert!(!queue.has_pending());

    let log = log.into_inner();
    for worker in 0..4 {
        let sequence: Vec<usize> = log.iter().filter(|(w, _)| *w == worker).map(|(_, n)| *n).collect();
        assert_eq!(sequence, (0..25).collect::<Vec<_>>());
    }
}

#[test]
fn test_sender_fails_after_queue_dropped() {
    let queue = UiTaskQueue::<()>::new();
    let sender = queue.sender();
    drop(queue);
    assert_eq!(sender.post(|_| {}).unwrap_err(), SignalError::QueueClosed);
}

#[test]
fn test_property_store_written_off_thread_is_observed() {
    let store = PropertyStore::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    store.changed().connect(move |(key, value)| {
        seen_clone.lock().push(format!("{key}={value}"));
    });

    let writer = store.clone();
    thread::spawn(move || {
        writer.set("listsync.busy", "1");
        writer.set_bool("listsync.busy", false);
    })
    .join()
    .unwrap();

    assert_eq!(store.get("listsync.busy"), "");
    assert_eq!(*seen.lock(), ["listsync.busy=1", "listsync.busy="]);
}
