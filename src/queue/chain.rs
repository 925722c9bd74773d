/*!
 * FIFO Waiter Chain
 *
 * The shared core of the fair and communal queues: a singly-threaded-looking
 * list that is in fact mutated lock-free by arbitrary registering, waking,
 * and cancelling threads. A fixed sentinel head (never removed) anchors an
 * atomic `next` chain; registration appends at the physical tail, so arrival
 * order is registration order and traversal respects it.
 *
 * # Design: Lazy Unlink
 *
 * A textbook doubly-linked delete would serialize every cancellation against
 * every registration, defeating the point of a low-latency wait queue.
 * Instead, cancellation marks the node `removed` and splices it out only
 * opportunistically; any node left behind is swept by the next traversal
 * that walks past it. The structural rules that make this safe:
 *
 * - A node's `next` never transitions from `Some` back to `None`, so the
 *   physical tail is unique and an append can never be lost to a splice.
 * - Only *interior* removed nodes (those with a successor) are ever spliced.
 *   A removed tail stays linked, inert, until an append gives it a
 *   successor; the sweep after that reclaims it.
 * - `prev` is a hint, not an invariant: it lets a cancelling node try an
 *   O(1) self-splice, and correctness never depends on it. It is cleared
 *   once the node is off the chain so a spliced-out node cannot keep its
 *   neighbors alive through a back-reference cycle.
 *
 * Nodes are reference-counted (`Arc` links via `arc-swap`), so a traverser
 * still holding a spliced-out node can keep walking through it safely; the
 * memory is reclaimed when the last holder drops it. That is what makes
 * lazy unlinking memory-safe here without epochs or hazard pointers.
 *
 * A cancelled node is therefore reachable for at most one full traversal
 * (any `wake_all`, `wake_one`, registration walk, or count), plus one
 * append if it was the tail when cancelled.
 */

use crate::handle::{QueueNode, Waiter};
use crate::queue::{wake_result, WakeResult};
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(crate) struct ChainNode<E> {
    waiter: Option<Arc<Waiter>>,
    resource: Option<E>,
    next: ArcSwapOption<ChainNode<E>>,
    prev: ArcSwapOption<ChainNode<E>>,
    removed: AtomicBool,
}

impl<E> ChainNode<E> {
    fn sentinel() -> Self {
        Self {
            waiter: None,
            resource: None,
            next: ArcSwapOption::empty(),
            prev: ArcSwapOption::empty(),
            removed: AtomicBool::new(false),
        }
    }

    pub(crate) fn resource(&self) -> Option<&E> {
        self.resource.as_ref()
    }

    fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }
}

impl<E: Send + Sync + 'static> QueueNode for ChainNode<E> {
    fn unlink(&self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Best-effort O(1) self-splice through the prev hint; only interior
        // nodes may be spliced (a tail's next is still None). Any failure
        // here just leaves the node for the next traversal's sweep.
        if let (Some(next), Some(prev)) = (self.next.load_full(), self.prev.load_full()) {
            let expected = self as *const ChainNode<E> as *mut ChainNode<E>;
            let _ = prev.next.compare_and_swap(expected, Some(Arc::clone(&next)));
            if !next.is_removed() {
                next.prev.store(Some(prev));
            }
        }
        self.prev.store(None);
    }
}

pub(crate) struct Chain<E> {
    head: Arc<ChainNode<E>>,
}

impl<E: Send + Sync + 'static> Chain<E> {
    pub(crate) fn new() -> Self {
        Self {
            head: Arc::new(ChainNode::sentinel()),
        }
    }

    /// Append a waiter at the physical tail. Lock-free: on CAS failure the
    /// walk resumes from the node that won, so retry cost is bounded by the
    /// contended tail, not the whole chain.
    pub(crate) fn push(&self, waiter: Arc<Waiter>, resource: E) -> Arc<ChainNode<E>> {
        let node = Arc::new(ChainNode {
            waiter: Some(waiter),
            resource: Some(resource),
            next: ArcSwapOption::empty(),
            prev: ArcSwapOption::empty(),
            removed: AtomicBool::new(false),
        });
        let mut tail = Arc::clone(&self.head);
        loop {
            match Self::advance(&tail) {
                Some(next) => tail = next,
                None => {
                    node.prev.store(Some(Arc::clone(&tail)));
                    let expected: Option<Arc<ChainNode<E>>> = None;
                    let witnessed = tail
                        .next
                        .compare_and_swap(&expected, Some(Arc::clone(&node)));
                    if witnessed.is_none() {
                        return node;
                    }
                    // Another append won the tail; keep walking from it.
                }
            }
        }
    }

    /// One hop forward from `at`, sweeping removed interior nodes as it
    /// goes. Returns the next physically linked node (which may be a
    /// removed tail, kept so appends stay anchored), or `None` at the end.
    fn advance(at: &Arc<ChainNode<E>>) -> Option<Arc<ChainNode<E>>> {
        loop {
            let next = at.next.load_full()?;
            if !next.is_removed() {
                return Some(next);
            }
            match next.next.load_full() {
                // Removed tail: cannot splice without moving the tail.
                None => return Some(next),
                Some(after) => {
                    let expected = Arc::as_ptr(&next) as *mut ChainNode<E>;
                    let _ = at.next.compare_and_swap(expected, Some(after));
                    // Spliced (or lost to someone who did); re-read.
                }
            }
        }
    }

    /// Wake matching waiters in registration order. Stops after the first
    /// successful handoff unless `wake_all`; the per-waiter CAS guarantees
    /// no waiter is delivered twice even against concurrent wakers.
    pub(crate) fn wake_where<F>(&self, mut matches: F, wake_all: bool) -> WakeResult
    where
        F: FnMut(&ChainNode<E>) -> bool,
    {
        let mut woken = 0usize;
        let mut at = Arc::clone(&self.head);
        while let Some(node) = Self::advance(&at) {
            if let Some(waiter) = &node.waiter {
                if matches(&node) && waiter.try_wake() {
                    woken += 1;
                    if !wake_all {
                        break;
                    }
                }
            }
            at = node;
        }
        wake_result(woken)
    }

    /// Approximate count of live matching waiters (diagnostics only).
    pub(crate) fn count_where<F>(&self, mut matches: F) -> usize
    where
        F: FnMut(&ChainNode<E>) -> bool,
    {
        let mut count = 0usize;
        let mut at = Arc::clone(&self.head);
        while let Some(node) = Self::advance(&at) {
            if let Some(waiter) = &node.waiter {
                if waiter.waiting() && matches(&node) {
                    count += 1;
                }
            }
            at = node;
        }
        count
    }

    /// Physically linked nodes, sentinel excluded. Test-only: observes
    /// zombies that `count_where` already ignores.
    #[cfg(test)]
    fn physical_len(&self) -> usize {
        let mut len = 0usize;
        let mut cursor = self.head.next.load_full();
        while let Some(node) = cursor {
            len += 1;
            cursor = node.next.load_full();
        }
        len
    }
}

impl<E> Drop for Chain<E> {
    fn drop(&mut self) {
        // Break the prev back-references so no node pair outlives the queue
        // through a reference cycle. Late cancels from surviving handles
        // only see cleared hints, which the unlink path tolerates.
        let mut cursor = self.head.next.swap(None);
        while let Some(node) = cursor {
            node.prev.store(None);
            cursor = node.next.swap(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(chain: &Chain<u32>, resource: u32) -> (Arc<Waiter>, Arc<ChainNode<u32>>) {
        let waiter = Arc::new(Waiter::new());
        let node = chain.push(Arc::clone(&waiter), resource);
        (waiter, node)
    }

    #[test]
    fn wake_order_is_registration_order() {
        let chain = Chain::new();
        let (first, _) = registered(&chain, 1);
        let (second, _) = registered(&chain, 2);
        let (third, _) = registered(&chain, 3);

        assert_eq!(chain.wake_where(|_| true, false), WakeResult::Woken(1));
        assert!(!first.waiting());
        assert!(second.waiting());

        assert_eq!(chain.wake_where(|_| true, false), WakeResult::Woken(1));
        assert!(!second.waiting());
        assert!(third.waiting());
    }

    #[test]
    fn scoped_wake_skips_other_resources() {
        let chain = Chain::new();
        let (a1, _) = registered(&chain, 7);
        let (b, _) = registered(&chain, 8);
        let (a2, _) = registered(&chain, 7);

        let result = chain.wake_where(|n| n.resource() == Some(&7), true);
        assert_eq!(result, WakeResult::Woken(2));
        assert!(!a1.waiting());
        assert!(!a2.waiting());
        assert!(b.waiting());
    }

    #[test]
    fn cancelled_interior_node_is_swept() {
        let chain = Chain::new();
        let (_w1, _n1) = registered(&chain, 1);
        let (w2, n2) = registered(&chain, 2);
        let (_w3, _n3) = registered(&chain, 3);

        assert!(w2.try_cancel());
        n2.unlink();

        // The self-splice already removed it from the physical chain.
        assert_eq!(chain.physical_len(), 2);
        assert_eq!(chain.count_where(|_| true), 2);
    }

    #[test]
    fn cancelled_tail_is_reclaimed_after_next_append() {
        let chain = Chain::new();
        let (_w1, _n1) = registered(&chain, 1);
        let (w2, n2) = registered(&chain, 2);

        assert!(w2.try_cancel());
        n2.unlink();
        // A removed tail cannot be spliced; it anchors the next append.
        assert_eq!(chain.physical_len(), 2);

        let (_w3, _n3) = registered(&chain, 3);
        assert_eq!(chain.wake_where(|_| true, true), WakeResult::Woken(2));
        // The sweep that walked the chain reclaimed the zombie.
        assert_eq!(chain.physical_len(), 2);
    }

    #[test]
    fn woken_then_cancelled_nodes_leave_no_residue() {
        let chain = Chain::new();
        let mut parts = Vec::new();
        for i in 0..4 {
            parts.push(registered(&chain, i));
        }
        assert_eq!(chain.wake_where(|_| true, true), WakeResult::Woken(4));
        for (_, node) in &parts {
            node.unlink();
        }
        assert_eq!(chain.wake_where(|_| true, true), WakeResult::NoWaiters);
        // All interior zombies were swept; at most the tail zombie remains.
        assert!(chain.physical_len() <= 1);
        assert_eq!(chain.count_where(|_| true), 0);
    }

    #[test]
    fn unlink_is_idempotent() {
        let chain = Chain::new();
        let (w, n) = registered(&chain, 1);
        assert!(w.try_cancel());
        n.unlink();
        n.unlink();
        assert_eq!(chain.count_where(|_| true), 0);
    }
}
