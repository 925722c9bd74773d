/*!
 * Waiter Core and Wait Handle
 *
 * One `Waiter` is one thread's registration for one waiting episode. Its
 * `state` word carries the single correctness-critical invariant of the whole
 * crate: exactly one thread (a waker, or the owner via cancel) wins the CAS
 * away from `WAITING`. Everything else - parking, unparking, interruption,
 * physical unlinking - keys off that one transition.
 *
 * # Design: Parking
 *
 * Blocking uses `parking_lot_core` keyed on the waiter's address (the waiter
 * lives in an `Arc`, so the address is stable for its lifetime). The park
 * validation closure re-checks the state word under the parking lot's bucket
 * lock; a waker always flips the state *before* unparking, so a wake can
 * never slip between the waiter's last check and its sleep.
 */

use crate::pause::{PauseStrategy, SpinThenPark};
use parking_lot_core::{park, unpark_one, ParkResult, ParkToken, UnparkToken};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// Eligible to be woken.
pub(crate) const STATE_WAITING: u8 = 1;
/// A waker won the flip.
pub(crate) const STATE_WOKEN: u8 = 2;
/// The owner won the flip via `cancel` (or an interrupt was honored).
pub(crate) const STATE_CANCELLED: u8 = 3;

/// Outcome of a blocking wait
///
/// Deadline expiry and interruption are ordinary returns, not errors; the
/// caller re-checks its own condition and decides whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A waker flipped this waiter's flag.
    Woken,
    /// The deadline elapsed first. The handle is still registered and still
    /// eligible to be woken; re-wait or cancel.
    TimedOut,
    /// The episode was cancelled, either before the call or by an
    /// [`Interrupter`] during it.
    Cancelled,
}

impl WaitOutcome {
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WaitOutcome::Woken)
    }

    #[inline(always)]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }

    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitOutcome::Cancelled)
    }
}

/// One thread's registration for one waiting episode.
///
/// Shared between the owning thread (which waits on it) and waker threads
/// (which may only observe and flip its flag). Pause strategies receive a
/// `&Waiter` to probe liveness and to park.
pub struct Waiter {
    state: AtomicU8,
    interrupted: AtomicBool,
    owner: ThreadId,
}

impl Waiter {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_WAITING),
            interrupted: AtomicBool::new(false),
            owner: thread::current().id(),
        }
    }

    /// Non-blocking liveness probe: still eligible to be woken?
    #[inline]
    pub fn waiting(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_WAITING
    }

    /// Has an [`Interrupter`] requested cancellation of this episode?
    #[inline]
    pub fn interrupt_requested(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    /// Block until unparked, a deadline, or a failed validation.
    ///
    /// Returns `false` only on deadline expiry. Spurious returns are
    /// possible and expected; callers loop and re-check. Must only be
    /// called from the registering thread.
    pub fn park(&self, deadline: Option<Instant>) -> bool {
        let result = unsafe {
            park(
                self.park_key(),
                || self.state.load(Ordering::Acquire) == STATE_WAITING,
                || {},
                |_, _| {},
                ParkToken(0),
                deadline,
            )
        };
        !matches!(result, ParkResult::TimedOut)
    }

    #[inline]
    pub(crate) fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// Exactly-once wake handoff: CAS `WAITING -> WOKEN`, then unpark.
    ///
    /// Returns whether this caller won the flip, so racing wakers never
    /// deliver the same waiter twice.
    pub(crate) fn try_wake(&self) -> bool {
        let won = self
            .state
            .compare_exchange(
                STATE_WAITING,
                STATE_WOKEN,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if won {
            self.unpark();
        }
        won
    }

    /// CAS `WAITING -> CANCELLED`. Loses cleanly to a concurrent wake.
    pub(crate) fn try_cancel(&self) -> bool {
        self.state
            .compare_exchange(
                STATE_WAITING,
                STATE_CANCELLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
        // Kick the owner out of park so it observes the request.
        self.unpark();
    }

    pub(crate) fn take_interrupt(&self) -> bool {
        self.interrupted.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn owned_by_current_thread(&self) -> bool {
        self.owner == thread::current().id()
    }

    #[inline]
    fn park_key(&self) -> usize {
        self as *const Waiter as usize
    }

    fn unpark(&self) {
        let _ = unsafe { unpark_one(self.park_key(), |_| UnparkToken(0)) };
    }
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("waiting", &self.waiting())
            .field("interrupt_requested", &self.interrupt_requested())
            .finish()
    }
}

/// Queue-side linkage behind a handle: how to physically remove the node
/// once its waiter is no longer eligible, and whether the registration is
/// still current (the exclusive queue's slot-identity check).
pub(crate) trait QueueNode: Send + Sync {
    /// Physically remove this node from the queue structure. Idempotent;
    /// safe to call after the waiter has been woken.
    fn unlink(&self);

    fn still_valid(&self) -> bool {
        true
    }
}

/// Clonable token that requests cancellation of a waiting episode from any
/// thread.
///
/// The waiting thread observes the request at its next wake-from-park point
/// and returns [`WaitOutcome::Cancelled`] from interruptible waits;
/// [`WaitHandle::wait_forever_uninterrupted`] absorbs it. If a wake races the
/// interrupt, exactly one wins and the other is a no-op.
#[derive(Clone)]
pub struct Interrupter {
    waiter: Arc<Waiter>,
}

impl Interrupter {
    pub fn interrupt(&self) {
        self.waiter.interrupt();
    }
}

impl fmt::Debug for Interrupter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interrupter")
            .field("waiting", &self.waiter.waiting())
            .finish()
    }
}

/// One thread's registration on a wait queue.
///
/// Returned by `register()`. Not `Send`: only the registering thread may
/// block on or cancel a handle. Waker threads interact with the waiter
/// through the queue's `wake_*` operations (or an [`Interrupter`]), never
/// through the handle.
///
/// Dropping a handle cancels it, so an abandoned registration cannot leave a
/// live waiter behind in the queue.
pub struct WaitHandle<P: PauseStrategy = SpinThenPark> {
    waiter: Arc<Waiter>,
    node: Arc<dyn QueueNode>,
    pause: P,
    _not_send: PhantomData<*const ()>,
}

impl<P: PauseStrategy> WaitHandle<P> {
    pub(crate) fn new(waiter: Arc<Waiter>, node: Arc<dyn QueueNode>, pause: P) -> Self {
        Self {
            waiter,
            node,
            pause,
            _not_send: PhantomData,
        }
    }

    /// Block until woken or interrupted.
    ///
    /// If the waiter was already woken (or cancelled) before the call, this
    /// returns immediately without ever pausing. The handle is deregistered
    /// on every exit path.
    pub fn wait_forever(&self) -> WaitOutcome {
        self.wait_inner(None, true)
    }

    /// Block until woken, absorbing interruption requests.
    ///
    /// Unlike [`wait_forever`](Self::wait_forever) this never returns early:
    /// an [`Interrupter`] only costs one extra loop iteration.
    pub fn wait_forever_uninterrupted(&self) {
        loop {
            match self.waiter.state() {
                STATE_WAITING => self.pause.pause(&self.waiter),
                _ => {
                    self.node.unlink();
                    return;
                }
            }
        }
    }

    /// Block until woken, interrupted, or `budget` has elapsed.
    ///
    /// Deadline expiry is a normal exit: the handle stays registered with
    /// `waiting() == true`, and the caller re-checks its condition before
    /// re-waiting or cancelling.
    pub fn wait_for(&self, budget: Duration) -> WaitOutcome {
        match Instant::now().checked_add(budget) {
            Some(deadline) => self.wait_inner(Some(deadline), true),
            // Unrepresentable deadline: indistinguishable from forever.
            None => self.wait_inner(None, true),
        }
    }

    /// [`wait_for`](Self::wait_for) with a millisecond budget.
    pub fn wait_millis(&self, millis: u64) -> WaitOutcome {
        self.wait_for(Duration::from_millis(millis))
    }

    /// [`wait_for`](Self::wait_for) with a nanosecond budget.
    pub fn wait_nanos(&self, nanos: u64) -> WaitOutcome {
        self.wait_for(Duration::from_nanos(nanos))
    }

    /// Block until woken, interrupted, or `deadline` passes. A deadline
    /// already in the past degrades to a liveness check.
    pub fn wait_until(&self, deadline: Instant) -> WaitOutcome {
        self.wait_inner(Some(deadline), true)
    }

    /// Withdraw this registration.
    ///
    /// Idempotent, and safe to call after the waiter has already been woken:
    /// the state flip (if still possible) has exactly one winner, and the
    /// physical unlink is a no-op the second time.
    pub fn cancel(&self) {
        self.waiter.try_cancel();
        self.node.unlink();
    }

    /// Non-blocking probe: still eligible to be woken?
    #[inline]
    pub fn waiting(&self) -> bool {
        self.waiter.waiting()
    }

    /// Is this registration still live from the owning queue's point of
    /// view? For most queues this mirrors [`waiting`](Self::waiting); the
    /// exclusive queue additionally checks that its slot still holds this
    /// waiter and that the caller is the registering thread.
    pub fn valid(&self) -> bool {
        self.waiter.waiting() && self.node.still_valid()
    }

    /// Token for requesting cancellation from another thread.
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            waiter: Arc::clone(&self.waiter),
        }
    }

    fn wait_inner(&self, deadline: Option<Instant>, interruptible: bool) -> WaitOutcome {
        loop {
            match self.waiter.state() {
                STATE_WOKEN => {
                    self.node.unlink();
                    return WaitOutcome::Woken;
                }
                STATE_CANCELLED => {
                    self.node.unlink();
                    return WaitOutcome::Cancelled;
                }
                _ => {}
            }

            if interruptible && self.waiter.take_interrupt() {
                if self.waiter.try_cancel() {
                    self.node.unlink();
                    return WaitOutcome::Cancelled;
                }
                // Lost the flip to a concurrent waker; report the wake.
                continue;
            }

            match deadline {
                Some(d) => {
                    if Instant::now() >= d {
                        return WaitOutcome::TimedOut;
                    }
                    self.pause.pause_until(&self.waiter, d);
                }
                None => self.pause.pause(&self.waiter),
            }
        }
    }
}

impl<P: PauseStrategy> Drop for WaitHandle<P> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<P: PauseStrategy> fmt::Debug for WaitHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitHandle")
            .field("waiting", &self.waiting())
            .field("valid", &self.valid())
            .finish()
    }
}
