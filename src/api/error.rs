//! Errors surfaced by the routing layer.

use std::fmt;

/// Errors that can occur while routing allocations or running mark
/// lifecycle operations.
///
/// No error is retried automatically; all are surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The enclosing environment is not set up for virtual-memory routing:
    /// the runtime binding is missing, a rebind was attempted, or a scope
    /// precondition was violated. Fatal to the calling scope-open.
    Configuration(String),

    /// The routing stack was popped without a matching push, or entries
    /// were popped out of LIFO order. Indicates a scope-management bug
    /// upstream; never recovered silently.
    StackDiscipline(&'static str),

    /// The backing allocator failed inside an active scope. The scope
    /// remains open and must still be closed by its own teardown.
    Allocation {
        /// Requested allocation size in bytes.
        size: usize,
        /// Collaborator-reported reason.
        reason: String,
    },

    /// The virtual memory manager rejected a release or materialize call.
    /// Remaining marks in the same call are not processed.
    Lifecycle {
        /// The mark whose processing failed.
        mark: String,
        /// Collaborator-reported reason.
        reason: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Configuration(reason) => {
                write!(f, "virtual memory routing unavailable: {}", reason)
            }
            RouteError::StackDiscipline(reason) => {
                write!(f, "routing stack discipline violated: {}", reason)
            }
            RouteError::Allocation { size, reason } => {
                write!(f, "backing allocation of {} bytes failed: {}", size, reason)
            }
            RouteError::Lifecycle { mark, reason } => {
                write!(f, "lifecycle operation failed for mark {:?}: {}", mark, reason)
            }
        }
    }
}

impl std::error::Error for RouteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RouteError::Configuration("runtime not bound".into());
        assert!(err.to_string().contains("runtime not bound"));

        let err = RouteError::Allocation {
            size: 4096,
            reason: "device out of memory".into(),
        };
        assert!(err.to_string().contains("4096"));
        assert!(err.to_string().contains("device out of memory"));

        let err = RouteError::Lifecycle {
            mark: "weights".into(),
            reason: "unknown blob state".into(),
        };
        assert!(err.to_string().contains("weights"));
    }
}
