/*!
 * Wait Queues
 *
 * Four queue flavors over the same waiter core:
 *
 * - [`UnfairWaitQueue`]: LIFO stack; O(1) register and cancel, wake order
 *   unspecified. Optimized for throughput.
 * - [`FairWaitQueue`]: FIFO chain; wakes in registration order.
 * - [`CommunalWaitQueue`]: FIFO chain whose waiters carry a resource key;
 *   wake operations can target only the waiters whose key matches.
 * - [`ExclusiveWaitQueue`]: single slot; at most one registered waiter, for
 *   contention known by construction to be 1:1.
 *
 * Every operation on every queue is lock-free: registration and wake are
 * bounded CAS loops, and a waker can never be stalled by a waiter.
 */

use std::sync::Arc;

mod chain;
mod communal;
mod exclusive;
mod fair;
mod unfair;

pub use communal::{CommunalWaitQueue, Equality, EqualityFn, ObjectEquality};
pub use exclusive::ExclusiveWaitQueue;
pub use fair::FairWaitQueue;
pub use unfair::UnfairWaitQueue;

use crate::pause::{Park, Spin, SpinThenPark};

/// Unfair queue that never parks; for callers that bound waits externally.
pub type SpinWaitQueue = UnfairWaitQueue<Spin>;
/// Unfair queue that parks immediately; lowest CPU cost.
pub type ParkWaitQueue = UnfairWaitQueue<Park>;
/// FIFO queue with adaptive spin-then-park waiting.
pub type FairSpinParkWaitQueue = FairWaitQueue<SpinThenPark>;
/// LIFO queue with adaptive spin-then-park waiting.
pub type UnfairSpinParkWaitQueue = UnfairWaitQueue<SpinThenPark>;

/// Result of a wake operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No eligible waiters were registered
    NoWaiters,
}

impl WakeResult {
    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

pub(crate) fn wake_result(woken: usize) -> WakeResult {
    if woken == 0 {
        WakeResult::NoWaiters
    } else {
        WakeResult::Woken(woken)
    }
}

/// Pointer identity over optional nodes; CAS success detection for the
/// snapshot-based `arc_swap` loops.
pub(crate) fn same_node<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
