//! Process-wide runtime state.
//!
//! The collaborators (backing memory, virtual memory manager, stream
//! accessor) are bound exactly once per process; everything here is shared
//! across threads and safe under concurrent use.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::api::config::{RouterConfig, RuntimeBinding, DEFAULT_ROUTING_STACK_CAPACITY};
use crate::api::error::RouteError;
use crate::api::stats::RouterStats;
use crate::backend::{BackingMemory, StreamId, StreamProvider, VirtualMemoryManager};
use crate::core::pool::DeferredFreeQueue;
use crate::sync::mutex::Mutex;

/// Everything bound to the process: collaborators, configuration, stats
/// and the deferred free queue.
pub(crate) struct Runtime {
    backing: Arc<dyn BackingMemory>,
    manager: Arc<dyn VirtualMemoryManager>,
    streams: Box<dyn StreamProvider>,
    config: RouterConfig,
    stats: StatCounters,
    deferred: DeferredFreeQueue,
}

impl Runtime {
    pub(crate) fn backing(&self) -> &dyn BackingMemory {
        self.backing.as_ref()
    }

    pub(crate) fn manager(&self) -> &dyn VirtualMemoryManager {
        self.manager.as_ref()
    }

    pub(crate) fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub(crate) fn stats(&self) -> &StatCounters {
        &self.stats
    }

    pub(crate) fn deferred(&self) -> &DeferredFreeQueue {
        &self.deferred
    }
}

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Bind the collaborators. Fails on rebind: the routing layer has
/// single-initialization semantics so the backing pair is never registered
/// under two identities.
pub(crate) fn bind(binding: RuntimeBinding) -> Result<(), RouteError> {
    let stats = StatCounters::new(binding.config.track_stats);
    let runtime = Runtime {
        backing: binding.backing,
        manager: binding.manager,
        streams: binding
            .streams
            .unwrap_or_else(|| Box::new(ThreadStreams)),
        config: binding.config,
        stats,
        deferred: DeferredFreeQueue::new(),
    };
    RUNTIME.set(runtime).map_err(|_| {
        RouteError::Configuration("runtime is already bound for this process".into())
    })
}

/// The bound runtime, or `Configuration` if none has been bound yet.
pub(crate) fn runtime() -> Result<&'static Runtime, RouteError> {
    RUNTIME.get().ok_or_else(|| {
        RouteError::Configuration(
            "virtual memory runtime is not bound; call RuntimeBinding::bind() first".into(),
        )
    })
}

pub(crate) fn try_runtime() -> Option<&'static Runtime> {
    RUNTIME.get()
}

pub(crate) fn is_bound() -> bool {
    RUNTIME.get().is_some()
}

/// Routing-stack capacity for newly initialized threads.
pub(crate) fn configured_stack_capacity() -> usize {
    RUNTIME
        .get()
        .map(|rt| rt.config.routing_stack_capacity)
        .unwrap_or(DEFAULT_ROUTING_STACK_CAPACITY)
}

/// The stream the calling thread is currently issuing to, from the bound
/// provider or the per-thread default.
pub(crate) fn current_stream() -> StreamId {
    match RUNTIME.get() {
        Some(rt) => rt.streams.current_stream(),
        None => ThreadStreams.current_stream(),
    }
}

// ---------------------------------------------------------------------------
// Default stream provider
// ---------------------------------------------------------------------------

/// Fallback stream accessor: a distinct id per host thread.
struct ThreadStreams;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_STREAM: Cell<u64> = const { Cell::new(0) };
}

impl StreamProvider for ThreadStreams {
    fn current_stream(&self) -> StreamId {
        THREAD_STREAM.with(|slot| {
            let mut id = slot.get();
            if id == 0 {
                id = NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed);
                slot.set(id);
            }
            StreamId(id)
        })
    }
}

// ---------------------------------------------------------------------------
// Teardown error stash
// ---------------------------------------------------------------------------

/// Errors raised while a `ScopeGuard` was dropped, where no `Result` can
/// flow back to the caller. Drained by `take_teardown_errors`.
static TEARDOWN_ERRORS: Mutex<Vec<RouteError>> = Mutex::new(Vec::new());

pub(crate) fn stash_teardown_error(err: RouteError) {
    TEARDOWN_ERRORS.lock().push(err);
}

pub(crate) fn take_teardown_errors() -> Vec<RouteError> {
    std::mem::take(&mut *TEARDOWN_ERRORS.lock())
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Process-wide atomic counters behind `router_stats()`.
pub(crate) struct StatCounters {
    enabled: bool,
    scopes_opened: AtomicU64,
    scopes_closed: AtomicU64,
    blobs_routed: AtomicU64,
    bytes_routed: AtomicU64,
    blobs_unrouted: AtomicU64,
    blobs_released: AtomicU64,
    blobs_materialized: AtomicU64,
    foreign_frees_deferred: AtomicU64,
}

impl StatCounters {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            scopes_opened: AtomicU64::new(0),
            scopes_closed: AtomicU64::new(0),
            blobs_routed: AtomicU64::new(0),
            bytes_routed: AtomicU64::new(0),
            blobs_unrouted: AtomicU64::new(0),
            blobs_released: AtomicU64::new(0),
            blobs_materialized: AtomicU64::new(0),
            foreign_frees_deferred: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_scope_opened(&self) {
        if self.enabled {
            self.scopes_opened.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_scope_closed(&self) {
        if self.enabled {
            self.scopes_closed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_routed(&self, bytes: usize) {
        if self.enabled {
            self.blobs_routed.fetch_add(1, Ordering::Relaxed);
            self.bytes_routed.fetch_add(bytes as u64, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_unrouted(&self) {
        if self.enabled {
            self.blobs_unrouted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_released(&self, count: usize) {
        if self.enabled {
            self.blobs_released.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_materialized(&self, count: usize) {
        if self.enabled {
            self.blobs_materialized
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_deferred(&self) {
        if self.enabled {
            self.foreign_frees_deferred.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> RouterStats {
        RouterStats {
            scopes_opened: self.scopes_opened.load(Ordering::Relaxed),
            scopes_closed: self.scopes_closed.load(Ordering::Relaxed),
            blobs_routed: self.blobs_routed.load(Ordering::Relaxed),
            bytes_routed: self.bytes_routed.load(Ordering::Relaxed),
            blobs_unrouted: self.blobs_unrouted.load(Ordering::Relaxed),
            blobs_released: self.blobs_released.load(Ordering::Relaxed),
            blobs_materialized: self.blobs_materialized.load(Ordering::Relaxed),
            foreign_frees_deferred: self.foreign_frees_deferred.load(Ordering::Relaxed),
        }
    }
}
