//! Process-wide routing statistics.

use std::fmt;

use crate::core::global;

/// Snapshot of the routing layer's counters.
///
/// Counters are cumulative for the process. All zeros before a runtime is
/// bound or when `RouterConfig::track_stats` is off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Scopes opened.
    pub scopes_opened: u64,
    /// Scopes closed (normal or abnormal exit).
    pub scopes_closed: u64,
    /// Blobs routed through scopes.
    pub blobs_routed: u64,
    /// Bytes routed through scopes.
    pub bytes_routed: u64,
    /// Blobs individually freed through the routing layer.
    pub blobs_unrouted: u64,
    /// Blobs released by mark.
    pub blobs_released: u64,
    /// Blobs materialized by mark.
    pub blobs_materialized: u64,
    /// Frees parked on the deferred queue.
    pub foreign_frees_deferred: u64,
}

impl fmt::Display for RouterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Router stats:")?;
        writeln!(f, "  scopes: {} opened, {} closed", self.scopes_opened, self.scopes_closed)?;
        writeln!(
            f,
            "  routed: {} blobs, {} bytes",
            self.blobs_routed, self.bytes_routed
        )?;
        writeln!(
            f,
            "  lifecycle: {} released, {} materialized",
            self.blobs_released, self.blobs_materialized
        )?;
        write!(
            f,
            "  frees: {} individual, {} deferred",
            self.blobs_unrouted, self.foreign_frees_deferred
        )
    }
}

/// Snapshot the process-wide routing counters.
pub fn router_stats() -> RouterStats {
    global::try_runtime()
        .map(|rt| rt.stats().snapshot())
        .unwrap_or_default()
}
