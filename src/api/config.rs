//! Router configuration and runtime binding.

use std::sync::Arc;

use crate::api::error::RouteError;
use crate::backend::{BackingMemory, StreamProvider, VirtualMemoryManager};
use crate::core::global;

/// Routing-stack capacity used before a runtime is bound.
pub const DEFAULT_ROUTING_STACK_CAPACITY: usize = 8;

/// Tuning knobs for the routing layer.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Initial capacity of each thread's routing stack.
    pub routing_stack_capacity: usize,

    /// Maintain the process-wide counters behind `router_stats()`.
    pub track_stats: bool,

    /// Park frees arriving on threads without an active scope instead of
    /// forwarding them immediately.
    pub defer_foreign_frees: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            routing_stack_capacity: DEFAULT_ROUTING_STACK_CAPACITY,
            track_stats: true,
            defer_foreign_frees: true,
        }
    }
}

impl RouterConfig {
    /// Create a minimal config: no statistics, no deferral.
    pub fn minimal() -> Self {
        Self {
            routing_stack_capacity: DEFAULT_ROUTING_STACK_CAPACITY,
            track_stats: false,
            defer_foreign_frees: false,
        }
    }

    /// Builder pattern: set the routing-stack capacity.
    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.routing_stack_capacity = capacity;
        self
    }

    /// Builder pattern: enable or disable statistics.
    pub fn with_stats(mut self, track: bool) -> Self {
        self.track_stats = track;
        self
    }

    /// Builder pattern: enable or disable foreign-free deferral.
    pub fn with_deferred_frees(mut self, defer: bool) -> Self {
        self.defer_foreign_frees = defer;
        self
    }
}

/// One-time binding of the routing layer to its collaborators.
///
/// The backing pair and manager come from the host runtime; the stream
/// provider is optional (a per-thread default is used otherwise). Binding
/// succeeds at most once per process - a second bind fails with
/// [`RouteError::Configuration`], so the backing pair is never registered
/// under two identities.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use markalloc::{RouterConfig, RuntimeBinding};
/// # let backing: Arc<dyn markalloc::BackingMemory> = unimplemented!();
/// # let manager: Arc<dyn markalloc::VirtualMemoryManager> = unimplemented!();
///
/// RuntimeBinding::new(backing, manager)
///     .with_config(RouterConfig::default().with_stack_capacity(16))
///     .bind()?;
/// # Ok::<(), markalloc::RouteError>(())
/// ```
pub struct RuntimeBinding {
    pub(crate) backing: Arc<dyn BackingMemory>,
    pub(crate) manager: Arc<dyn VirtualMemoryManager>,
    pub(crate) streams: Option<Box<dyn StreamProvider>>,
    pub(crate) config: RouterConfig,
}

impl RuntimeBinding {
    /// Create a binding with the default config and stream provider.
    pub fn new(
        backing: Arc<dyn BackingMemory>,
        manager: Arc<dyn VirtualMemoryManager>,
    ) -> Self {
        Self {
            backing,
            manager,
            streams: None,
            config: RouterConfig::default(),
        }
    }

    /// Use a host-supplied stream accessor.
    pub fn with_streams(mut self, streams: impl StreamProvider + 'static) -> Self {
        self.streams = Some(Box::new(streams));
        self
    }

    /// Use a custom router configuration.
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind the collaborators for the rest of the process lifetime.
    pub fn bind(self) -> Result<(), RouteError> {
        global::bind(self)
    }
}

/// Whether a runtime has been bound for this process.
pub fn runtime_is_bound() -> bool {
    global::is_bound()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.routing_stack_capacity, DEFAULT_ROUTING_STACK_CAPACITY);
        assert!(config.track_stats);
        assert!(config.defer_foreign_frees);
    }

    #[test]
    fn test_builders() {
        let config = RouterConfig::minimal()
            .with_stack_capacity(32)
            .with_stats(true)
            .with_deferred_frees(false);
        assert_eq!(config.routing_stack_capacity, 32);
        assert!(config.track_stats);
        assert!(!config.defer_foreign_frees);
    }
}
