//! # markalloc
//!
//! Mark-scoped routing and bulk lifecycle for device virtual memory
//! allocations.
//!
//! ## Features
//!
//! - Scopes route allocations to a caller-chosen mark and backing mode
//! - Thread-confined routing stacks with strict push/pop discipline
//! - RAII scope guards: pop and pool deactivation on every exit path
//! - Bulk release / materialize across one or more marks
//! - Pluggable collaborators (backing pair, manager, stream accessor)
//!   bound once per process
//! - Deferred handling of frees arriving on foreign threads
//! - Process-wide routing statistics and coded diagnostics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markalloc::{scope, release_with_marks, BackedMode};
//!
//! # fn demo() -> Result<(), markalloc::RouteError> {
//! // Bind the host collaborators once at startup (RuntimeBinding::bind),
//! // then route allocations by mark:
//! {
//!     let guard = scope("kv_cache", BackedMode::Cpu)?;
//!     let blob = guard.alloc(1 << 20)?;
//!     // ... hand the blob to the device ...
//!     guard.close()?;
//! }
//!
//! // Later, drop everything allocated under the mark in one sweep.
//! let released = release_with_marks(["kv_cache"])?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod backend;
pub mod diagnostics;

mod core;
mod sync;

// Re-export public API at crate root for convenience
pub use api::alloc::{pending_foreign_frees, routed_alloc, routed_free};
pub use api::config::{runtime_is_bound, RouterConfig, RuntimeBinding};
pub use api::error::RouteError;
pub use api::lifecycle::{materialize_with_marks, release_with_marks};
pub use api::mark::{BackedMode, Mark};
pub use api::routing::{
    current_mark, current_routing, current_stream, pop_routing, push_routing, routing_depth,
    RoutingEntry, RoutingStack,
};
pub use api::scope::{scope, take_teardown_errors, with_scope, ScopeGuard};
pub use api::stats::{router_stats, RouterStats};

// Collaborator contracts
pub use backend::{
    BackingMemory, BlobRecord, DevicePtr, StreamId, StreamProvider, VirtualMemoryManager,
};

// Diagnostics
pub use diagnostics::{
    set_strict_mode, strict_mode, suppress_diagnostics, Diagnostic, DiagnosticKind, StrictMode,
    StrictModeGuard,
};
