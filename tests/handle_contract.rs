/*!
 * Wait Handle Contract Tests
 *
 * The blocking API across threads: interruption, the uninterruptible
 * variant, re-waiting after timeout, and the pure spin/park compositions.
 */

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use waitq::{FairWaitQueue, Park, ParkWaitQueue, Spin, SpinWaitQueue, WaitOutcome};

#[test]
fn interrupter_cancels_a_parked_waiter() {
    let queue = Arc::new(FairWaitQueue::new());
    let (tx, rx) = mpsc::channel();

    let waiter = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let handle = queue.register();
            tx.send(handle.interrupter()).unwrap();
            let outcome = handle.wait_forever();
            (outcome, handle.valid())
        })
    };

    let interrupter = rx.recv().unwrap();
    thread::sleep(Duration::from_millis(30));
    interrupter.interrupt();

    let (outcome, valid) = waiter.join().unwrap();
    assert_eq!(outcome, WaitOutcome::Cancelled);
    assert!(!valid);
    assert_eq!(queue.waiter_count(), 0);
}

#[test]
fn uninterrupted_wait_outlives_interrupts() {
    let queue = Arc::new(FairWaitQueue::new());
    let (tx, rx) = mpsc::channel();

    let waiter = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let handle = queue.register();
            tx.send(handle.interrupter()).unwrap();
            handle.wait_forever_uninterrupted();
            handle.waiting()
        })
    };

    let interrupter = rx.recv().unwrap();
    for _ in 0..3 {
        interrupter.interrupt();
        thread::sleep(Duration::from_millis(10));
    }
    // Only a real wake releases it.
    while !queue.wake_one().is_woken() {
        thread::yield_now();
    }
    assert!(!waiter.join().unwrap());
}

#[test]
fn handle_can_rewait_after_timeout() {
    let queue = Arc::new(FairWaitQueue::new());
    let (timed_out_tx, timed_out_rx) = mpsc::channel();

    let waiter = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let handle = queue.register();
            let first = handle.wait_millis(20);
            timed_out_tx.send(()).unwrap();
            // Still registered; the same episode can be resumed.
            let second = handle.wait_millis(2_000);
            (first, second)
        })
    };

    timed_out_rx.recv().unwrap();
    while !queue.wake_one().is_woken() {
        thread::yield_now();
    }

    let (first, second) = waiter.join().unwrap();
    assert_eq!(first, WaitOutcome::TimedOut);
    assert_eq!(second, WaitOutcome::Woken);
}

#[test]
fn wait_until_past_deadline_is_immediate() {
    let queue = FairWaitQueue::new();
    let handle = queue.register();
    let start = Instant::now();
    let outcome = handle.wait_until(start - Duration::from_secs(1));
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn spin_composition_wakes_without_parking() {
    let queue = Arc::new(SpinWaitQueue::with_pause(Spin));
    let waiter = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let handle = queue.register();
            handle.wait_millis(2_000)
        })
    };

    while queue.is_empty() {
        thread::yield_now();
    }
    assert!(queue.wake_one().is_woken());
    assert_eq!(waiter.join().unwrap(), WaitOutcome::Woken);
}

#[test]
fn park_composition_wakes_from_deep_sleep() {
    let queue = Arc::new(ParkWaitQueue::with_pause(Park));
    let waiter = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let handle = queue.register();
            handle.wait_forever()
        })
    };

    // Long past registration; the waiter is parked, not spinning.
    while queue.is_empty() {
        thread::yield_now();
    }
    thread::sleep(Duration::from_millis(50));
    assert!(queue.wake_one().is_woken());
    assert_eq!(waiter.join().unwrap(), WaitOutcome::Woken);
}

#[test]
fn timed_wait_does_not_overshoot() {
    let queue = FairWaitQueue::new();
    let handle = queue.register();
    let start = Instant::now();
    assert_eq!(handle.wait_millis(50), WaitOutcome::TimedOut);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(250));
}
