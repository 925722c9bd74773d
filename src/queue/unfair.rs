/*!
 * Unfair Wait Queue
 *
 * A Treiber stack of waiters: one atomic head, O(1) lock-free push and pop,
 * wake order most-recently-registered-first. Explicitly unfair - LIFO is
 * cheaper than maintaining FIFO order and is the right trade where the
 * caller only needs *someone* woken, not the oldest waiter.
 *
 * Cancellation is O(1): the waiter's flag flips and the node stays linked
 * until a later wake walks past it and skips the husk. Each node is pushed
 * exactly once and never re-pushed, so the pop CAS is immune to ABA.
 */

use crate::config::WaitConfig;
use crate::error::WaitResult;
use crate::handle::{QueueNode, WaitHandle, Waiter};
use crate::pause::{Pause, PauseStrategy, SpinThenPark};
use crate::queue::{same_node, wake_result, WakeResult};
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;

struct StackNode {
    waiter: Arc<Waiter>,
    next: ArcSwapOption<StackNode>,
}

impl QueueNode for StackNode {
    // Lazy: the flag flip alone cancels; wakes sweep past cleared nodes.
    fn unlink(&self) {}
}

/// Unbounded multi-waiter queue with LIFO wake order.
pub struct UnfairWaitQueue<P: PauseStrategy = SpinThenPark> {
    head: ArcSwapOption<StackNode>,
    pause: P,
}

impl UnfairWaitQueue {
    /// Create with the default spin-then-park strategy.
    pub fn new() -> Self {
        Self::with_pause(SpinThenPark::default())
    }
}

impl Default for UnfairWaitQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UnfairWaitQueue<Pause> {
    /// Create with a runtime-selected pause strategy.
    pub fn from_config(config: &WaitConfig) -> WaitResult<Self> {
        Ok(Self::with_pause(config.build()?))
    }
}

impl<P: PauseStrategy> UnfairWaitQueue<P> {
    pub fn with_pause(pause: P) -> Self {
        Self {
            head: ArcSwapOption::empty(),
            pause,
        }
    }

    /// Register the calling thread as a waiter: lock-free stack push.
    pub fn register(&self) -> WaitHandle<P> {
        let waiter = Arc::new(Waiter::new());
        let node = Arc::new(StackNode {
            waiter: Arc::clone(&waiter),
            next: ArcSwapOption::empty(),
        });
        let mut top = self.head.load_full();
        loop {
            node.next.store(top.clone());
            let witnessed: Option<Arc<StackNode>> =
                arc_swap::Guard::into_inner(self.head.compare_and_swap(&top, Some(Arc::clone(&node))));
            if same_node(&witnessed, &top) {
                break;
            }
            top = witnessed;
        }
        WaitHandle::new(waiter, node, self.pause.clone())
    }

    /// Wake the most recently registered eligible waiter.
    ///
    /// Pops until a pop wins its wake CAS; already-cancelled nodes are
    /// discarded as no-op skips.
    pub fn wake_one(&self) -> WakeResult {
        loop {
            let top = self.head.load_full();
            let node = match &top {
                Some(node) => Arc::clone(node),
                None => return WakeResult::NoWaiters,
            };
            let next = node.next.load_full();
            let witnessed: Option<Arc<StackNode>> =
                arc_swap::Guard::into_inner(self.head.compare_and_swap(&top, next));
            if same_node(&witnessed, &top) {
                // Popped: drop the link so a long-lived handle cannot pin
                // the rest of the stack.
                node.next.store(None);
                if node.waiter.try_wake() {
                    return WakeResult::Woken(1);
                }
            }
        }
    }

    /// Wake every eligible waiter.
    ///
    /// The whole stack is detached with one atomic exchange, so a push
    /// racing this call either lands before the swap (and is woken) or
    /// retries against the new empty head (and is not lost).
    pub fn wake_all(&self) -> WakeResult {
        let mut woken = 0usize;
        let mut cursor = self.head.swap(None);
        while let Some(node) = cursor {
            if node.waiter.try_wake() {
                woken += 1;
            }
            cursor = node.next.swap(None);
        }
        wake_result(woken)
    }

    /// Approximate count of live waiters (diagnostics only).
    pub fn waiter_count(&self) -> usize {
        let mut count = 0usize;
        let mut cursor = self.head.load_full();
        while let Some(node) = cursor {
            if node.waiter.waiting() {
                count += 1;
            }
            cursor = node.next.load_full();
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.waiter_count() == 0
    }
}

impl<P: PauseStrategy> fmt::Debug for UnfairWaitQueue<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnfairWaitQueue")
            .field("waiters", &self.waiter_count())
            .finish()
    }
}
