/*!
 * Compile-Time Tunables
 *
 * Spin budgets and phase thresholds for the pause strategies.
 */

/// Spin iterations a [`SpinThenPark`](crate::SpinThenPark) waiter burns before
/// falling back to an OS-level park.
pub const DEFAULT_SPIN_ITERATIONS: u32 = 1000;

/// Upper bound accepted by [`WaitConfig::validate`](crate::WaitConfig::validate).
/// Budgets above this are almost certainly a unit mistake (nanoseconds passed
/// as iterations) and burn whole scheduler quanta per episode.
pub const MAX_SPIN_ITERATIONS: u32 = 1 << 22;

/// A spinning waiter yields the CPU once every this many iterations, so a
/// long spin budget cannot starve the thread that would wake it.
pub(crate) const SPIN_YIELD_INTERVAL: u32 = 128;

/// Deadline re-check cadence inside a spin episode. Power of two for cheap
/// masking.
pub(crate) const SPIN_DEADLINE_CHECK_INTERVAL: u32 = 64;
