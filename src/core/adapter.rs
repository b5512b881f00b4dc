//! The backing allocator adapter.
//!
//! Bridges the host's allocate/free pair to the routing layer: every
//! allocation made through the adapter is attributed to the current
//! routing entry and registered with the virtual memory manager.

use std::sync::OnceLock;

use crate::api::error::RouteError;
use crate::api::routing;
use crate::backend::{BlobRecord, DevicePtr};
use crate::core::global;

/// Adapter over the bound [`BackingMemory`](crate::BackingMemory) pair.
///
/// Constructed at most once per process, lazily, and cached: constructing
/// it repeatedly would re-register the backing pair under distinct adapter
/// identities.
pub(crate) struct BackingAllocator {
    _private: (),
}

static ADAPTER: OnceLock<BackingAllocator> = OnceLock::new();

/// The cached adapter, built on first use.
///
/// Fails with `Configuration` when the runtime is not bound - the
/// enclosing environment is not set up for virtual-memory routing.
pub(crate) fn cached_adapter() -> Result<&'static BackingAllocator, RouteError> {
    global::runtime()?;
    Ok(ADAPTER.get_or_init(|| BackingAllocator { _private: () }))
}

impl BackingAllocator {
    /// Allocate `size` bytes and record the blob under the current routing
    /// entry.
    ///
    /// If registration fails the backing allocation is freed before the
    /// error propagates, so the manager and the backing never disagree.
    pub(crate) fn allocate_routed(&self, size: usize) -> Result<DevicePtr, RouteError> {
        let rt = global::runtime()?;
        let entry = routing::current_routing().ok_or_else(|| RouteError::Allocation {
            size,
            reason: "no routing entry is active on this thread".into(),
        })?;

        let address = rt.backing().allocate(size)?;
        let record = BlobRecord {
            address,
            size,
            mark: entry.mark().clone(),
            mode: entry.mode(),
            stream: entry.stream(),
        };
        if let Err(err) = rt.manager().register_blob(record) {
            rt.backing().free(address, size);
            return Err(err);
        }
        rt.stats().record_routed(size);
        Ok(address)
    }

    /// Free one routed blob: unregister it from the manager, then return
    /// the backing memory.
    ///
    /// A blob the manager no longer tracks (already drained by a by-mark
    /// release) is skipped; its backing is the manager's business.
    pub(crate) fn free_routed(&self, address: DevicePtr, size: usize) {
        if let Ok(rt) = global::runtime() {
            if rt.manager().unregister_blob(address) {
                rt.backing().free(address, size);
                rt.stats().record_unrouted();
            }
        }
    }
}

/// Forward every parked foreign-thread free, returning how many ran.
pub(crate) fn drain_foreign_frees() -> Result<usize, RouteError> {
    let rt = global::runtime()?;
    if rt.deferred().is_empty() {
        return Ok(0);
    }
    let backing = cached_adapter()?;
    Ok(rt.deferred().drain(backing))
}
