//! Cross-thread lock semantics: mutual exclusion, timed acquire bounds,
//! reentrancy depth tracking, and the non-reentrant self-lock hazard.
//!
//! Run with: `cargo test --test lock_semantics`

use locklab::scenario::reentrant_demo::recursive_traverse_self_lock;
use locklab::sync::{Mutex, ReentrantLock};
use locklab::test_utils::init_test_logging;
use locklab::{assert_with_log, test_complete, test_phase};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn init_test(name: &str) {
    init_test_logging();
    test_phase!(name);
}

#[test]
fn mutual_exclusion_holds_under_contention() {
    init_test("mutual_exclusion_holds_under_contention");

    let lock = Mutex::new("gauge");
    let in_section = AtomicU32::new(0);
    let max_seen = AtomicU32::new(0);

    thread::scope(|scope| {
        for index in 0..4 {
            let lock = &lock;
            let in_section = &in_section;
            let max_seen = &max_seen;
            thread::Builder::new()
                .name(format!("gauge-worker-{index}"))
                .spawn_scoped(scope, move || {
                    for _ in 0..200 {
                        lock.acquire();
                        let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        in_section.fetch_sub(1, Ordering::SeqCst);
                        lock.release().expect("holder releases");
                    }
                })
                .expect("spawn worker");
        }
    });

    let max = max_seen.load(Ordering::SeqCst);
    assert_with_log!(max == 1, "never more than one holder", 1u32, max);
    test_complete!("mutual_exclusion_holds_under_contention");
}

#[test]
fn timed_acquire_waits_at_least_the_timeout() {
    init_test("timed_acquire_waits_at_least_the_timeout");

    let lock = Mutex::new("held");
    let timeout = Duration::from_millis(100);

    thread::scope(|scope| {
        let (held_tx, held_rx) = mpsc::channel();
        let lock = &lock;
        thread::Builder::new()
            .name("holder".to_string())
            .spawn_scoped(scope, move || {
                lock.acquire();
                held_tx.send(()).expect("main is waiting");
                thread::sleep(Duration::from_millis(500));
                lock.release().expect("holder releases");
            })
            .expect("spawn holder");

        held_rx.recv().expect("holder signals");
        let start = Instant::now();
        let acquired = lock.try_acquire(Some(timeout));
        let waited = start.elapsed();

        assert_with_log!(!acquired, "acquire times out", false, acquired);
        assert_with_log!(waited >= timeout, "waited full timeout", timeout, waited);
        // Generous slack for scheduling; the point is it did not wait
        // for the 500ms hold.
        let bound = timeout + Duration::from_millis(300);
        assert_with_log!(waited < bound, "returned near deadline", bound, waited);
    });
    test_complete!("timed_acquire_waits_at_least_the_timeout");
}

#[test]
fn zero_timeout_probe_returns_immediately() {
    init_test("zero_timeout_probe_returns_immediately");

    let lock = Mutex::new("probe");
    thread::scope(|scope| {
        let (held_tx, held_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let lock = &lock;
        thread::Builder::new()
            .name("holder".to_string())
            .spawn_scoped(scope, move || {
                lock.acquire();
                held_tx.send(()).expect("main is waiting");
                done_rx.recv().expect("main signals");
                lock.release().expect("holder releases");
            })
            .expect("spawn holder");

        held_rx.recv().expect("holder signals");
        let start = Instant::now();
        let acquired = lock.try_acquire(Some(Duration::ZERO));
        let waited = start.elapsed();

        assert_with_log!(!acquired, "probe fails while held", false, acquired);
        let bound = Duration::from_millis(100);
        assert_with_log!(waited < bound, "probe is immediate", bound, waited);

        done_tx.send(()).expect("holder is waiting");
    });
    test_complete!("zero_timeout_probe_returns_immediately");
}

#[test]
fn reentrant_depth_tracks_nesting() {
    init_test("reentrant_depth_tracks_nesting");

    let lock = ReentrantLock::new("nested");
    lock.acquire();
    assert_with_log!(lock.held_depth() == 1, "depth 1", 1u32, lock.held_depth());
    lock.acquire();
    assert_with_log!(lock.held_depth() == 2, "depth 2", 2u32, lock.held_depth());
    lock.acquire();
    assert_with_log!(lock.held_depth() == 3, "depth 3", 3u32, lock.held_depth());

    lock.release().expect("balanced release");
    assert_with_log!(lock.held_depth() == 2, "back to 2", 2u32, lock.held_depth());
    lock.release().expect("balanced release");
    lock.release().expect("balanced release");
    assert_with_log!(!lock.is_locked(), "fully released", false, lock.is_locked());
    test_complete!("reentrant_depth_tracks_nesting");
}

#[test]
fn reentrant_lock_blocks_other_threads() {
    init_test("reentrant_lock_blocks_other_threads");

    let lock = ReentrantLock::new("owned");
    lock.acquire();
    lock.acquire();

    thread::scope(|scope| {
        let lock = &lock;
        let probe = thread::Builder::new()
            .name("outsider".to_string())
            .spawn_scoped(scope, move || lock.try_acquire(Some(Duration::from_millis(50))))
            .expect("spawn outsider");
        let acquired = probe.join().expect("outsider returns");
        assert_with_log!(!acquired, "outsider blocked", false, acquired);
    });

    lock.release().expect("balanced release");
    lock.release().expect("balanced release");
    test_complete!("reentrant_lock_blocks_other_threads");
}

#[test]
fn self_lock_recursion_never_completes() {
    init_test("self_lock_recursion_never_completes");

    // The recursing thread blocks on the lock it already holds and is
    // deliberately leaked; the watchdog only observes that it never
    // reports completion.
    let lock = Arc::new(Mutex::new("self"));
    let (done_tx, done_rx) = mpsc::channel();

    let worker = Arc::clone(&lock);
    thread::Builder::new()
        .name("self-locker".to_string())
        .spawn(move || {
            let result = recursive_traverse_self_lock(&worker, 1);
            let _ = done_tx.send(result);
        })
        .expect("spawn self-locker");

    let outcome = done_rx.recv_timeout(Duration::from_secs(1));
    let hung = outcome.is_err();
    assert_with_log!(hung, "recursion hangs on itself", true, hung);
    assert_with_log!(lock.is_locked(), "first acquire still held", true, lock.is_locked());
    test_complete!("self_lock_recursion_never_completes");
}
