/*!
 * Pure Park Strategy
 *
 * Always blocks on the OS parking lot. Lowest CPU cost, highest wake
 * latency; the right default when waits are expected to outlast a
 * scheduler quantum.
 */

use super::PauseStrategy;
use crate::handle::Waiter;
use std::time::Instant;

/// Park-immediately pause strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Park;

impl PauseStrategy for Park {
    fn pause(&self, waiter: &Waiter) {
        waiter.park(None);
    }

    fn pause_until(&self, waiter: &Waiter, deadline: Instant) {
        waiter.park(Some(deadline));
    }
}
