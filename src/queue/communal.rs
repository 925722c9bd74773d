/*!
 * Communal (Resource-Scoped) Wait Queue
 *
 * A FIFO wait queue whose waiters each carry an opaque resource key. Wake
 * operations can target only the waiters whose key matches ("wake whoever
 * is waiting on bucket 7") instead of stampeding every waiter, with the
 * match decided by a pluggable [`Equality`]. Scoped wakes respect
 * registration order among the matching waiters.
 */

use crate::config::WaitConfig;
use crate::error::WaitResult;
use crate::handle::{WaitHandle, Waiter};
use crate::pause::{Pause, PauseStrategy, SpinThenPark};
use crate::queue::chain::Chain;
use crate::queue::WakeResult;
use std::fmt;
use std::sync::Arc;

/// Resource-matching predicate for scoped wakes.
///
/// Only ever used to decide which waiters a scoped wake targets; never to
/// deduplicate resources.
pub trait Equality<E>: Send + Sync {
    fn equals(&self, a: &E, b: &E) -> bool;
}

/// Default equality: delegates to `PartialEq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectEquality;

impl<E: PartialEq> Equality<E> for ObjectEquality {
    #[inline]
    fn equals(&self, a: &E, b: &E) -> bool {
        a == b
    }
}

/// Adapts a closure as an [`Equality`].
#[derive(Debug, Clone)]
pub struct EqualityFn<F>(pub F);

impl<E, F> Equality<E> for EqualityFn<F>
where
    F: Fn(&E, &E) -> bool + Send + Sync,
{
    #[inline]
    fn equals(&self, a: &E, b: &E) -> bool {
        (self.0)(a, b)
    }
}

/// Unbounded FIFO wait queue with per-waiter resource keys and targeted
/// wake-up.
pub struct CommunalWaitQueue<E, P: PauseStrategy = SpinThenPark, Q = ObjectEquality> {
    chain: Chain<E>,
    pause: P,
    equality: Q,
}

impl<E> CommunalWaitQueue<E>
where
    E: PartialEq + Send + Sync + 'static,
{
    /// Create with the default spin-then-park strategy and `PartialEq`
    /// resource matching.
    pub fn new() -> Self {
        Self::with_parts(SpinThenPark::default(), ObjectEquality)
    }
}

impl<E> Default for CommunalWaitQueue<E>
where
    E: PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, Q> CommunalWaitQueue<E, SpinThenPark, Q>
where
    E: Send + Sync + 'static,
    Q: Equality<E>,
{
    /// Create with a caller-supplied resource equality.
    pub fn with_equality(equality: Q) -> Self {
        Self::with_parts(SpinThenPark::default(), equality)
    }
}

impl<E> CommunalWaitQueue<E, Pause>
where
    E: PartialEq + Send + Sync + 'static,
{
    /// Create with a runtime-selected pause strategy.
    pub fn from_config(config: &WaitConfig) -> WaitResult<Self> {
        Ok(Self::with_parts(config.build()?, ObjectEquality))
    }
}

impl<E, P, Q> CommunalWaitQueue<E, P, Q>
where
    E: Send + Sync + 'static,
    P: PauseStrategy,
    Q: Equality<E>,
{
    pub fn with_parts(pause: P, equality: Q) -> Self {
        Self {
            chain: Chain::new(),
            pause,
            equality,
        }
    }

    /// Register the calling thread as waiting on `resource`.
    pub fn register(&self, resource: E) -> WaitHandle<P> {
        let waiter = Arc::new(Waiter::new());
        let node = self.chain.push(Arc::clone(&waiter), resource);
        WaitHandle::new(waiter, node, self.pause.clone())
    }

    /// Wake the longest-registered eligible waiter, regardless of resource.
    pub fn wake_one(&self) -> WakeResult {
        self.chain.wake_where(|_| true, false)
    }

    /// Wake every eligible waiter, regardless of resource.
    pub fn wake_all(&self) -> WakeResult {
        self.chain.wake_where(|_| true, true)
    }

    /// Wake the longest-registered waiter whose key matches `resource`.
    ///
    /// The per-waiter CAS makes the handoff exactly-once: two concurrent
    /// scoped wakes for the same resource cannot deliver the same waiter
    /// twice.
    pub fn wake_one_for(&self, resource: &E) -> WakeResult {
        self.chain
            .wake_where(|node| self.matches(node.resource(), resource), false)
    }

    /// Wake every waiter whose key matches `resource`, in registration
    /// order. Non-matching waiters are left untouched.
    pub fn wake_all_for(&self, resource: &E) -> WakeResult {
        self.chain
            .wake_where(|node| self.matches(node.resource(), resource), true)
    }

    /// Approximate count of live waiters (diagnostics only).
    pub fn waiter_count(&self) -> usize {
        self.chain.count_where(|_| true)
    }

    /// Approximate count of live waiters keyed by `resource`.
    pub fn waiter_count_for(&self, resource: &E) -> usize {
        self.chain
            .count_where(|node| self.matches(node.resource(), resource))
    }

    pub fn is_empty(&self) -> bool {
        self.waiter_count() == 0
    }

    #[inline]
    fn matches(&self, key: Option<&E>, resource: &E) -> bool {
        key.map_or(false, |key| self.equality.equals(key, resource))
    }
}

impl<E, P, Q> fmt::Debug for CommunalWaitQueue<E, P, Q>
where
    E: Send + Sync + 'static,
    P: PauseStrategy,
    Q: Equality<E>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommunalWaitQueue")
            .field("waiters", &self.waiter_count())
            .finish()
    }
}
