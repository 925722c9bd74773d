/*!
 * waitq
 *
 * Wait queues and wait handles for contended concurrent stores.
 *
 * A store operation that finds its bucket locked, migrating, or otherwise
 * contended registers itself on a wait queue, re-checks its condition, and
 * parks until the resolving thread wakes it. This crate provides that
 * coordination primitive family:
 *
 * - [`UnfairWaitQueue`]: LIFO stack, O(1) push/pop, optimized for throughput
 * - [`FairWaitQueue`]: FIFO chain, wakes in registration order
 * - [`CommunalWaitQueue`]: FIFO chain with per-waiter resource keys and
 *   targeted wake-up (no thundering herd)
 * - [`ExclusiveWaitQueue`]: single-slot queue for 1:1 contention
 *
 * All registration, wake, and cancellation paths are lock-free; the only
 * blocking point is inside the waiting thread's own `wait_*` call. How a
 * waiter idles between liveness checks is a pluggable [`PauseStrategy`]:
 * pure spin, OS-level park, or spin-then-park.
 *
 * This crate is a signaling mechanism only. It protects no payload and
 * provides no mutual exclusion; a woken thread must always re-check the
 * condition it was waiting on.
 */

mod config;
mod error;
mod handle;
mod limits;
mod pause;
mod queue;

pub use config::{PauseKind, WaitConfig};
pub use error::{WaitError, WaitResult};
pub use handle::{Interrupter, WaitHandle, WaitOutcome, Waiter};
pub use limits::{DEFAULT_SPIN_ITERATIONS, MAX_SPIN_ITERATIONS};
pub use pause::{Park, Pause, PauseStrategy, Spin, SpinThenPark};
pub use queue::{
    CommunalWaitQueue, Equality, EqualityFn, ExclusiveWaitQueue, FairSpinParkWaitQueue,
    FairWaitQueue, ObjectEquality, ParkWaitQueue, SpinWaitQueue, UnfairSpinParkWaitQueue,
    UnfairWaitQueue, WakeResult,
};
