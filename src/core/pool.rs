//! Per-scope allocation pools and the deferred free queue.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_queue::SegQueue;

use crate::api::error::RouteError;
use crate::backend::DevicePtr;
use crate::core::adapter::BackingAllocator;
use crate::diagnostics::{self, MA901};

/// The allocation target of one open scope.
///
/// Alive only for the scope's lexical duration; the memory it routed
/// stays allocated after the pool is gone. Counters are cumulative over
/// the scope's lifetime.
pub(crate) struct Pool {
    backing: &'static BackingAllocator,
    blobs: AtomicUsize,
    bytes: AtomicUsize,
}

impl Pool {
    pub(crate) fn new(backing: &'static BackingAllocator) -> Self {
        Self {
            backing,
            blobs: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn alloc(&self, size: usize) -> Result<DevicePtr, RouteError> {
        let address = self.backing.allocate_routed(size)?;
        self.blobs.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
        Ok(address)
    }

    pub(crate) fn blob_count(&self) -> usize {
        self.blobs.load(Ordering::Relaxed)
    }

    pub(crate) fn byte_count(&self) -> usize {
        self.bytes.load(Ordering::Relaxed)
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<Rc<Pool>>> = const { RefCell::new(None) };
}

/// Install `pool` as the thread's allocation target, returning the
/// previously active pool so the caller can restore it.
pub(crate) fn activate(pool: Rc<Pool>) -> Option<Rc<Pool>> {
    ACTIVE.with(|slot| slot.borrow_mut().replace(pool))
}

/// Remove the active pool and restore `prev`.
///
/// The removed pool must be the one the closing scope installed. On a
/// mismatch (guards torn down out of order) the saved `prev` is stale;
/// the thread falls back to the unrouted default instead, and the
/// mismatch is reported. Teardown always proceeds.
pub(crate) fn deactivate(expected: &Rc<Pool>, prev: Option<Rc<Pool>>) {
    ACTIVE.with(|slot| {
        let mut slot = slot.borrow_mut();
        match slot.take() {
            Some(top) if Rc::ptr_eq(&top, expected) => *slot = prev,
            _ => diagnostics::emit(&MA901),
        }
    });
}

/// The thread's current allocation target, if a scope is open.
pub(crate) fn active_pool() -> Option<Rc<Pool>> {
    ACTIVE.with(|slot| slot.borrow().clone())
}

/// A free parked by a thread that owns no active scope.
struct ForeignFree {
    address: DevicePtr,
    size: usize,
}

/// Lock-free queue of frees arriving on foreign threads.
///
/// Drained at scope boundaries and before lifecycle operations so manager
/// bookkeeping stays ordered with routing-state transitions.
pub(crate) struct DeferredFreeQueue {
    queue: SegQueue<ForeignFree>,
}

impl DeferredFreeQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: SegQueue::new(),
        }
    }

    pub(crate) fn push(&self, address: DevicePtr, size: usize) {
        self.queue.push(ForeignFree { address, size });
    }

    /// Forward all pending frees through the adapter.
    pub(crate) fn drain(&self, backing: &BackingAllocator) -> usize {
        let mut drained = 0;
        while let Some(free) = self.queue.pop() {
            backing.free_routed(free.address, free.size);
            drained += 1;
        }
        drained
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_queue_order_independent_state() {
        let queue = DeferredFreeQueue::new();
        assert!(queue.is_empty());

        queue.push(DevicePtr(0x1000), 64);
        queue.push(DevicePtr(0x2000), 128);
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_empty());
    }
}
