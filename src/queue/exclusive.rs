/*!
 * Exclusive Wait Queue
 *
 * A degenerate single-slot queue: at most one thread may be registered at a
 * time, and a second registration is rejected immediately rather than
 * queued. For contention the caller knows by construction to be 1:1, such
 * as a single migrating bucket with a single blocked thread; callers must
 * externally serialize use of the queue per resource.
 */

use crate::config::WaitConfig;
use crate::error::{WaitError, WaitResult};
use crate::handle::{QueueNode, WaitHandle, Waiter};
use crate::pause::{Pause, PauseStrategy, SpinThenPark};
use crate::queue::WakeResult;
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;

struct Slot {
    occupant: ArcSwapOption<Waiter>,
}

/// Linkage behind an exclusive handle: releasing the slot on cancel, and
/// the slot-identity check behind `valid()`.
struct SlotNode {
    slot: Arc<Slot>,
    waiter: Arc<Waiter>,
}

impl QueueNode for SlotNode {
    fn unlink(&self) {
        // Release only if the slot still holds this waiter; a stale handle
        // must not evict a later registrant.
        let expected = Arc::as_ptr(&self.waiter) as *mut Waiter;
        let _ = self.slot.occupant.compare_and_swap(expected, None);
    }

    fn still_valid(&self) -> bool {
        let occupant = self.slot.occupant.load();
        occupant
            .as_ref()
            .map_or(false, |current| Arc::ptr_eq(current, &self.waiter))
            && self.waiter.owned_by_current_thread()
    }
}

/// Single-slot wait queue; its handle is the sole registration.
pub struct ExclusiveWaitQueue<P: PauseStrategy = SpinThenPark> {
    slot: Arc<Slot>,
    pause: P,
}

impl ExclusiveWaitQueue {
    /// Create with the default spin-then-park strategy.
    pub fn new() -> Self {
        Self::with_pause(SpinThenPark::default())
    }
}

impl Default for ExclusiveWaitQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusiveWaitQueue<Pause> {
    /// Create with a runtime-selected pause strategy.
    pub fn from_config(config: &WaitConfig) -> WaitResult<Self> {
        Ok(Self::with_pause(config.build()?))
    }
}

impl<P: PauseStrategy> ExclusiveWaitQueue<P> {
    pub fn with_pause(pause: P) -> Self {
        Self {
            slot: Arc::new(Slot {
                occupant: ArcSwapOption::empty(),
            }),
            pause,
        }
    }

    /// Claim the slot for the calling thread.
    ///
    /// Fails fast with [`WaitError::AlreadyRegistered`] if another thread
    /// holds it; registrations are never queued here.
    pub fn register(&self) -> WaitResult<WaitHandle<P>> {
        let waiter = Arc::new(Waiter::new());
        let empty: Option<Arc<Waiter>> = None;
        let witnessed = self
            .slot
            .occupant
            .compare_and_swap(&empty, Some(Arc::clone(&waiter)));
        if witnessed.is_some() {
            return Err(WaitError::AlreadyRegistered);
        }
        let node = Arc::new(SlotNode {
            slot: Arc::clone(&self.slot),
            waiter: Arc::clone(&waiter),
        });
        Ok(WaitHandle::new(waiter, node, self.pause.clone()))
    }

    /// Wake the registered waiter, if any. With a single possible waiter
    /// this is identical to [`wake_all`](Self::wake_all).
    pub fn wake_one(&self) -> WakeResult {
        match self.slot.occupant.load_full() {
            Some(waiter) if waiter.try_wake() => WakeResult::Woken(1),
            _ => WakeResult::NoWaiters,
        }
    }

    /// Wake the registered waiter, if any.
    pub fn wake_all(&self) -> WakeResult {
        self.wake_one()
    }

    /// 1 if the slot holds a live waiter, 0 otherwise.
    pub fn waiter_count(&self) -> usize {
        match self.slot.occupant.load_full() {
            Some(waiter) if waiter.waiting() => 1,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.waiter_count() == 0
    }
}

impl<P: PauseStrategy> fmt::Debug for ExclusiveWaitQueue<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveWaitQueue")
            .field("occupied", &(self.waiter_count() == 1))
            .finish()
    }
}
