/*!
 * Spin-Then-Park Strategy
 *
 * Busy-poll briefly, then fall back to an OS-level park. Halves the
 * syscall and context-switch cost for short critical sections while
 * bounding worst-case CPU waste; if the wake arrives during the spin
 * phase, parking is skipped entirely.
 */

use super::PauseStrategy;
use crate::handle::Waiter;
use crate::limits::DEFAULT_SPIN_ITERATIONS;
use crate::pause::spin_episode;
use std::time::Instant;

/// Adaptive spin-then-park pause strategy.
///
/// An iteration budget of `0` never spins, degrading to pure park.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinThenPark {
    iterations: u32,
}

impl SpinThenPark {
    pub const fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    pub const fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for SpinThenPark {
    fn default() -> Self {
        Self::new(DEFAULT_SPIN_ITERATIONS)
    }
}

impl PauseStrategy for SpinThenPark {
    fn pause(&self, waiter: &Waiter) {
        if !spin_episode(waiter, self.iterations, None) {
            waiter.park(None);
        }
    }

    fn pause_until(&self, waiter: &Waiter, deadline: Instant) {
        if !spin_episode(waiter, self.iterations, Some(deadline)) && Instant::now() < deadline {
            waiter.park(Some(deadline));
        }
    }
}
