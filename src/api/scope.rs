//! Scope guards binding a mark to an allocation pool.
//!
//! A scope routes every allocation made while it is open to its mark. The
//! guard owns the teardown: pool deactivation and stack pop happen exactly
//! once on every exit path, normal or panicking.

use std::rc::Rc;

use crate::api::error::RouteError;
use crate::api::mark::{BackedMode, Mark};
use crate::api::routing;
use crate::backend::{DevicePtr, StreamId};
use crate::core::{adapter, global, pool};
use crate::diagnostics::{self, MA101};

/// Open a scope routing allocations on this thread to `mark`.
///
/// Order of operations: the cached adapter is obtained (built on first
/// use), pending foreign frees are drained, a pool is created and a
/// routing entry pushed for the current stream, and the pool becomes the
/// thread's allocation target. If any step fails, no partial state is
/// left behind and the scope is never entered.
///
/// # Example
///
/// ```rust,no_run
/// use markalloc::{scope, release_with_marks, BackedMode};
///
/// let guard = scope("decode_batch", BackedMode::None)?;
/// let blob = guard.alloc(4096)?;
/// guard.close()?;
///
/// // Memory stays allocated after the scope; drain it by mark.
/// let released = release_with_marks(["decode_batch"])?;
/// assert_eq!(released, 1);
/// # Ok::<(), markalloc::RouteError>(())
/// ```
pub fn scope(mark: impl Into<Mark>, mode: BackedMode) -> Result<ScopeGuard, RouteError> {
    let mark = mark.into();
    if mark.is_empty() {
        return Err(RouteError::Configuration(
            "scope mark must be non-empty".into(),
        ));
    }

    let rt = global::runtime()?;
    let backing = adapter::cached_adapter()?;
    adapter::drain_foreign_frees()?;

    let stream = routing::current_stream();
    let pool = Rc::new(pool::Pool::new(backing));
    let token = routing::push_entry(mark.clone(), mode, stream);
    let prev = pool::activate(Rc::clone(&pool));
    rt.stats().record_scope_opened();

    Ok(ScopeGuard {
        pool,
        prev,
        mark,
        mode,
        stream,
        token,
        closed: false,
    })
}

/// Run a closure inside a scope, closing it on the way out.
///
/// Teardown errors surface as the returned `Result`; a panic inside the
/// closure still unwinds through the guard's teardown.
pub fn with_scope<F, R>(mark: impl Into<Mark>, mode: BackedMode, f: F) -> Result<R, RouteError>
where
    F: FnOnce(&ScopeGuard) -> R,
{
    let guard = scope(mark, mode)?;
    let result = f(&guard);
    guard.close()?;
    Ok(result)
}

/// Handle to an open scope.
///
/// Dropping the guard tears the scope down; errors raised there are
/// reported through diagnostics and stashed for [`take_teardown_errors`].
/// Call [`close`](ScopeGuard::close) instead to receive them as a
/// `Result`. The guard is bound to its opening thread.
pub struct ScopeGuard {
    pool: Rc<pool::Pool>,
    prev: Option<Rc<pool::Pool>>,
    mark: Mark,
    mode: BackedMode,
    stream: StreamId,
    token: u64,
    closed: bool,
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("mark", &self.mark)
            .field("mode", &self.mode)
            .field("stream", &self.stream)
            .field("token", &self.token)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ScopeGuard {
    /// The mark this scope routes to.
    pub fn mark(&self) -> &Mark {
        &self.mark
    }

    /// The backing policy attached to this scope.
    pub fn mode(&self) -> BackedMode {
        self.mode
    }

    /// The stream this scope was bound to at open time.
    pub fn stream(&self) -> StreamId {
        self.stream
    }

    /// Allocate through this scope.
    ///
    /// Valid only while this scope is the innermost routing target;
    /// allocating through an outer handle while a nested scope is open
    /// would mis-attribute the blob and is rejected.
    pub fn alloc(&self, size: usize) -> Result<DevicePtr, RouteError> {
        if routing::current_token() != Some(self.token) {
            return Err(RouteError::Allocation {
                size,
                reason: "scope handle is not the innermost active scope".into(),
            });
        }
        self.pool.alloc(size)
    }

    /// Number of blobs routed through this scope so far.
    pub fn routed_blobs(&self) -> usize {
        self.pool.blob_count()
    }

    /// Bytes routed through this scope so far.
    pub fn routed_bytes(&self) -> usize {
        self.pool.byte_count()
    }

    /// Close the scope, surfacing teardown errors.
    ///
    /// Teardown runs exactly once; the subsequent `Drop` becomes a no-op.
    pub fn close(mut self) -> Result<(), RouteError> {
        self.teardown()
    }

    /// Deactivate the pool, then pop the routing entry. Both steps run
    /// regardless of which fails; the first error is returned.
    fn teardown(&mut self) -> Result<(), RouteError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        pool::deactivate(&self.pool, self.prev.take());
        let popped = routing::pop_expecting(self.token);

        if let Some(rt) = global::try_runtime() {
            rt.stats().record_scope_closed();
        }
        let _ = adapter::drain_foreign_frees();

        popped.map(|_| ())
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            let context = err.to_string();
            global::stash_teardown_error(err);
            diagnostics::emit_with_context(&MA101, Some(&context));
        }
    }
}

/// Drain errors raised while scope guards were dropped.
///
/// `Drop` cannot return a `Result`; teardown failures are stashed
/// process-wide and handed out here, oldest first.
pub fn take_teardown_errors() -> Vec<RouteError> {
    global::take_teardown_errors()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scope opening needs a bound runtime, which is process-global; the
    // full lifecycle is exercised in tests/integration_tests.rs. Unit
    // tests here cover the unbound environment, which must stay unbound
    // for the whole lib-test process.

    #[test]
    fn test_scope_requires_bound_runtime() {
        let err = scope("weights", BackedMode::None).unwrap_err();
        assert!(matches!(err, RouteError::Configuration(_)));
        assert_eq!(routing::routing_depth(), 0);
    }

    #[test]
    fn test_empty_mark_rejected() {
        let err = scope("", BackedMode::None).unwrap_err();
        assert!(matches!(err, RouteError::Configuration(_)));
        assert_eq!(routing::routing_depth(), 0);
    }
}
