/*!
 * Model Tests
 *
 * Single-threaded property tests: arbitrary register/cancel/wake sequences
 * against reference models of the stack and chain disciplines. No thread
 * ever blocks; eligibility is observed through the handles' waiting flags.
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use waitq::{CommunalWaitQueue, FairWaitQueue, UnfairWaitQueue, WakeResult};

#[derive(Debug, Clone)]
enum Op {
    Register(u8),
    Cancel(usize),
    WakeOne,
    WakeAll,
    WakeOneFor(u8),
    WakeAllFor(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..3).prop_map(Op::Register),
        2 => (0usize..16).prop_map(Op::Cancel),
        2 => Just(Op::WakeOne),
        1 => Just(Op::WakeAll),
        2 => (0u8..3).prop_map(Op::WakeOneFor),
        1 => (0u8..3).prop_map(Op::WakeAllFor),
    ]
}

/// Reference model: registration order, key, and eligibility per handle.
struct Model {
    // (handle index, key, eligible)
    entries: Vec<(usize, u8, bool)>,
}

impl Model {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn register(&mut self, index: usize, key: u8) {
        self.entries.push((index, key, true));
    }

    fn cancel(&mut self, index: usize) {
        for entry in &mut self.entries {
            if entry.0 == index {
                entry.2 = false;
            }
        }
    }

    /// Wake eligible entries matching `key` (or any, if `None`); front-first
    /// when `fifo`, back-first otherwise. Returns the indices woken.
    fn wake(&mut self, key: Option<u8>, all: bool, fifo: bool) -> Vec<usize> {
        let mut woken = Vec::new();
        let order: Vec<usize> = if fifo {
            (0..self.entries.len()).collect()
        } else {
            (0..self.entries.len()).rev().collect()
        };
        for slot in order {
            let (index, entry_key, eligible) = self.entries[slot];
            if eligible && key.map_or(true, |k| k == entry_key) {
                self.entries[slot].2 = false;
                woken.push(index);
                if !all {
                    break;
                }
            }
        }
        woken
    }

    fn eligible(&self) -> Vec<bool> {
        let mut flags = vec![false; self.entries.len()];
        for &(index, _, eligible) in &self.entries {
            flags[index] = eligible;
        }
        flags
    }
}

fn check_result(result: WakeResult, woken: &[usize]) {
    if woken.is_empty() {
        assert_eq!(result, WakeResult::NoWaiters);
    } else {
        assert_eq!(result, WakeResult::Woken(woken.len()));
    }
}

proptest! {
    #[test]
    fn unfair_queue_matches_stack_model(ops in proptest::collection::vec(op_strategy(), 1..48)) {
        let queue = UnfairWaitQueue::new();
        let mut handles = Vec::new();
        let mut model = Model::new();

        for op in ops {
            match op {
                Op::Register(key) => {
                    model.register(handles.len(), key);
                    handles.push(queue.register());
                }
                Op::Cancel(i) if !handles.is_empty() => {
                    let i = i % handles.len();
                    handles[i].cancel();
                    model.cancel(i);
                }
                Op::Cancel(_) => {}
                Op::WakeOne | Op::WakeOneFor(_) => {
                    let woken = model.wake(None, false, false);
                    check_result(queue.wake_one(), &woken);
                }
                Op::WakeAll | Op::WakeAllFor(_) => {
                    let woken = model.wake(None, true, false);
                    check_result(queue.wake_all(), &woken);
                }
            }
            let observed: Vec<bool> = handles.iter().map(|h| h.waiting()).collect();
            assert_eq!(observed, model.eligible());
        }
    }

    #[test]
    fn fair_queue_matches_fifo_model(ops in proptest::collection::vec(op_strategy(), 1..48)) {
        let queue = FairWaitQueue::new();
        let mut handles = Vec::new();
        let mut model = Model::new();

        for op in ops {
            match op {
                Op::Register(key) => {
                    model.register(handles.len(), key);
                    handles.push(queue.register());
                }
                Op::Cancel(i) if !handles.is_empty() => {
                    let i = i % handles.len();
                    handles[i].cancel();
                    model.cancel(i);
                }
                Op::Cancel(_) => {}
                Op::WakeOne | Op::WakeOneFor(_) => {
                    let woken = model.wake(None, false, true);
                    check_result(queue.wake_one(), &woken);
                }
                Op::WakeAll | Op::WakeAllFor(_) => {
                    let woken = model.wake(None, true, true);
                    check_result(queue.wake_all(), &woken);
                }
            }
            let observed: Vec<bool> = handles.iter().map(|h| h.waiting()).collect();
            assert_eq!(observed, model.eligible());
        }
    }

    #[test]
    fn communal_queue_matches_scoped_model(ops in proptest::collection::vec(op_strategy(), 1..48)) {
        let queue = CommunalWaitQueue::<u8>::new();
        let mut handles = Vec::new();
        let mut model = Model::new();

        for op in ops {
            match op {
                Op::Register(key) => {
                    model.register(handles.len(), key);
                    handles.push(queue.register(key));
                }
                Op::Cancel(i) if !handles.is_empty() => {
                    let i = i % handles.len();
                    handles[i].cancel();
                    model.cancel(i);
                }
                Op::Cancel(_) => {}
                Op::WakeOne => {
                    let woken = model.wake(None, false, true);
                    check_result(queue.wake_one(), &woken);
                }
                Op::WakeAll => {
                    let woken = model.wake(None, true, true);
                    check_result(queue.wake_all(), &woken);
                }
                Op::WakeOneFor(key) => {
                    let woken = model.wake(Some(key), false, true);
                    check_result(queue.wake_one_for(&key), &woken);
                }
                Op::WakeAllFor(key) => {
                    let woken = model.wake(Some(key), true, true);
                    check_result(queue.wake_all_for(&key), &woken);
                }
            }
            let observed: Vec<bool> = handles.iter().map(|h| h.waiting()).collect();
            assert_eq!(observed, model.eligible());
        }
    }
}
