/*!
 * Fair Wait Queue
 *
 * FIFO: wake order matches registration order. Pays a tail walk per
 * registration for that guarantee; use [`UnfairWaitQueue`] where ordering
 * does not matter and throughput does.
 *
 * [`UnfairWaitQueue`]: crate::UnfairWaitQueue
 */

use crate::config::WaitConfig;
use crate::error::WaitResult;
use crate::handle::{WaitHandle, Waiter};
use crate::pause::{Pause, PauseStrategy, SpinThenPark};
use crate::queue::chain::Chain;
use crate::queue::WakeResult;
use std::fmt;
use std::sync::Arc;

/// Unbounded multi-waiter queue with FIFO wake order.
pub struct FairWaitQueue<P: PauseStrategy = SpinThenPark> {
    chain: Chain<()>,
    pause: P,
}

impl FairWaitQueue {
    /// Create with the default spin-then-park strategy.
    pub fn new() -> Self {
        Self::with_pause(SpinThenPark::default())
    }
}

impl Default for FairWaitQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FairWaitQueue<Pause> {
    /// Create with a runtime-selected pause strategy.
    pub fn from_config(config: &WaitConfig) -> WaitResult<Self> {
        Ok(Self::with_pause(config.build()?))
    }
}

impl<P: PauseStrategy> FairWaitQueue<P> {
    pub fn with_pause(pause: P) -> Self {
        Self {
            chain: Chain::new(),
            pause,
        }
    }

    /// Register the calling thread as a waiter. The caller re-checks its
    /// condition after registering and before blocking on the handle.
    pub fn register(&self) -> WaitHandle<P> {
        let waiter = Arc::new(Waiter::new());
        let node = self.chain.push(Arc::clone(&waiter), ());
        WaitHandle::new(waiter, node, self.pause.clone())
    }

    /// Wake the longest-registered eligible waiter.
    pub fn wake_one(&self) -> WakeResult {
        self.chain.wake_where(|_| true, false)
    }

    /// Wake every eligible waiter, in registration order.
    pub fn wake_all(&self) -> WakeResult {
        self.chain.wake_where(|_| true, true)
    }

    /// Approximate count of live waiters (diagnostics only).
    pub fn waiter_count(&self) -> usize {
        self.chain.count_where(|_| true)
    }

    pub fn is_empty(&self) -> bool {
        self.waiter_count() == 0
    }
}

impl<P: PauseStrategy> fmt::Debug for FairWaitQueue<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FairWaitQueue")
            .field("waiters", &self.waiter_count())
            .finish()
    }
}
