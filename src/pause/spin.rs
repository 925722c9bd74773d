/*!
 * Pure Spin Strategy
 *
 * Never parks. Lowest wake latency, highest CPU cost; only for callers that
 * bound the wait externally (their own timeout loop) or own an isolated
 * core. The spin loop interleaves hardware relax hints with an occasional
 * scheduler yield so a long spin cannot starve the thread that would
 * deliver the wake.
 */

use super::PauseStrategy;
use crate::handle::Waiter;
use crate::limits::{DEFAULT_SPIN_ITERATIONS, SPIN_DEADLINE_CHECK_INTERVAL, SPIN_YIELD_INTERVAL};
use std::time::Instant;

/// One spin episode: burn up to `budget` iterations re-checking the waiting
/// flag. Returns `true` as soon as the flag flips (the caller skips parking
/// entirely), `false` once the budget or deadline is exhausted.
pub(crate) fn spin_episode(waiter: &Waiter, budget: u32, deadline: Option<Instant>) -> bool {
    let mut spun = 0u32;
    while waiter.waiting() {
        if spun >= budget {
            return false;
        }
        if spun % SPIN_YIELD_INTERVAL == SPIN_YIELD_INTERVAL - 1 {
            std::thread::yield_now();
        } else {
            std::hint::spin_loop();
        }
        if spun % SPIN_DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return false;
                }
            }
        }
        spun += 1;
    }
    true
}

/// Pure busy-wait pause strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spin;

impl PauseStrategy for Spin {
    fn pause(&self, waiter: &Waiter) {
        spin_episode(waiter, DEFAULT_SPIN_ITERATIONS, None);
    }

    fn pause_until(&self, waiter: &Waiter, deadline: Instant) {
        spin_episode(waiter, DEFAULT_SPIN_ITERATIONS, Some(deadline));
    }
}
