//! The allocator routing stack.
//!
//! Each execution context keeps a stack of active routing entries; the top
//! entry decides which mark and backing mode the next allocation on that
//! context is attributed to. Push and pop must nest strictly - a pop with
//! no matching push is a scope-management bug and fails loudly.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::config::DEFAULT_ROUTING_STACK_CAPACITY;
use crate::api::error::RouteError;
use crate::api::mark::{BackedMode, Mark};
use crate::backend::StreamId;
use crate::core::global;
use crate::diagnostics::{self, MA001, MA002};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// One active routing target.
///
/// Owned by the scope that pushed it for the scope's lifetime and removed
/// exactly once, in strict LIFO order relative to its push.
#[derive(Debug, Clone)]
pub struct RoutingEntry {
    mark: Mark,
    mode: BackedMode,
    stream: StreamId,
    token: u64,
}

impl RoutingEntry {
    fn new(mark: Mark, mode: BackedMode, stream: StreamId) -> Self {
        Self {
            mark,
            mode,
            stream,
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The mark allocations are attributed to while this entry is on top.
    pub fn mark(&self) -> &Mark {
        &self.mark
    }

    /// The backing policy attached at push time.
    pub fn mode(&self) -> BackedMode {
        self.mode
    }

    /// The host-observed stream captured at push time.
    pub fn stream(&self) -> StreamId {
        self.stream
    }
}

/// A stack of routing entries for one execution context.
pub struct RoutingStack {
    entries: Vec<RoutingEntry>,
}

impl RoutingStack {
    /// Create a new routing stack.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ROUTING_STACK_CAPACITY)
    }

    /// Create a routing stack with a given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Push a new routing entry.
    pub fn push(&mut self, mark: Mark, mode: BackedMode, stream: StreamId) {
        self.push_entry(RoutingEntry::new(mark, mode, stream));
    }

    fn push_entry(&mut self, entry: RoutingEntry) {
        self.entries.push(entry);
    }

    /// Pop the current top entry.
    pub fn pop(&mut self) -> Option<RoutingEntry> {
        self.entries.pop()
    }

    /// The entry routing the next allocation, if any.
    pub fn current(&self) -> Option<&RoutingEntry> {
        self.entries.last()
    }

    /// Number of open routing entries.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Whether any open entry carries the given mark.
    pub fn is_routed(&self, mark: &str) -> bool {
        self.entries.iter().any(|entry| entry.mark.name() == mark)
    }
}

impl Default for RoutingStack {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static ROUTING: RefCell<Option<RoutingStack>> = const { RefCell::new(None) };
}

/// Run a closure against the calling thread's routing stack.
///
/// The stack is initialized lazily on first access, sized from the bound
/// runtime configuration when one exists.
fn with_stack<F, R>(f: F) -> R
where
    F: FnOnce(&mut RoutingStack) -> R,
{
    ROUTING.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let stack = borrow
            .get_or_insert_with(|| RoutingStack::with_capacity(global::configured_stack_capacity()));
        f(stack)
    })
}

/// Install a routing entry as the new top for the current execution
/// context. Subsequent allocations on this context are attributed to it
/// until the matching [`pop_routing`].
pub fn push_routing(mark: Mark, mode: BackedMode, stream: StreamId) {
    push_entry(mark, mode, stream);
}

pub(crate) fn push_entry(mark: Mark, mode: BackedMode, stream: StreamId) -> u64 {
    let entry = RoutingEntry::new(mark, mode, stream);
    let token = entry.token;
    with_stack(|stack| stack.push_entry(entry));
    token
}

/// Remove the current top entry, restoring the previous routing target
/// (which may be "no routing", the default).
///
/// Fails with [`RouteError::StackDiscipline`] if the stack is empty,
/// leaving no visible state change.
pub fn pop_routing() -> Result<RoutingEntry, RouteError> {
    with_stack(|stack| stack.pop()).ok_or_else(|| {
        diagnostics::emit(&MA001);
        RouteError::StackDiscipline("pop without a matching push")
    })
}

/// Pop for scope teardown: the removed entry must be the scope's own.
///
/// The top entry is removed even on mismatch - once every guard has run,
/// prior routing is restored - but the mismatch is reported, since it
/// means guards were torn down out of LIFO order.
pub(crate) fn pop_expecting(token: u64) -> Result<RoutingEntry, RouteError> {
    match with_stack(|stack| stack.pop()) {
        None => {
            diagnostics::emit(&MA001);
            Err(RouteError::StackDiscipline("pop without a matching push"))
        }
        Some(entry) if entry.token != token => {
            diagnostics::emit(&MA002);
            Err(RouteError::StackDiscipline(
                "routing entries popped out of LIFO order",
            ))
        }
        Some(entry) => Ok(entry),
    }
}

/// The entry routing the next allocation on this thread, if any.
pub fn current_routing() -> Option<RoutingEntry> {
    with_stack(|stack| stack.current().cloned())
}

/// The mark of the innermost open scope on this thread, if any.
pub fn current_mark() -> Option<Mark> {
    with_stack(|stack| stack.current().map(|entry| entry.mark.clone()))
}

/// Number of open routing entries on this thread.
pub fn routing_depth() -> usize {
    with_stack(|stack| stack.depth())
}

pub(crate) fn current_token() -> Option<u64> {
    with_stack(|stack| stack.current().map(|entry| entry.token))
}

/// The stream the calling thread is currently issuing to.
pub fn current_stream() -> StreamId {
    global::current_stream()
}
