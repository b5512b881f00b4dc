//! Marks and backing-mode policies.

use std::fmt;
use std::sync::Arc;

/// Selects how routed memory is backed when it is rematerialized.
///
/// The mode is attached to a scope when it opens and is immutable for the
/// scope's duration; every blob allocated inside the scope carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackedMode {
    /// The memory is not backed. Rematerialized memory has uninitialized
    /// content.
    None,

    /// The memory is zero-filled on rematerialize.
    Memset,

    /// The content is backed by host memory and restored on rematerialize.
    Cpu,

    /// The content is backed by pinned host memory and restored on
    /// rematerialize.
    Pinned,
}

impl Default for BackedMode {
    fn default() -> Self {
        Self::None
    }
}

/// A caller-chosen tag grouping allocations for later bulk lifecycle
/// operations.
///
/// Marks are not unique: multiple scopes may share one, and all of their
/// allocations accumulate under it until released or materialized.
/// Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mark {
    name: Arc<str>,
}

impl Mark {
    /// Create a new mark.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// Get the mark name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the mark is the empty string. Empty marks are rejected at
    /// scope open.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Mark {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Mark {
    fn from(name: String) -> Self {
        Self { name: name.into() }
    }
}

impl AsRef<str> for Mark {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_name() {
        let mark = Mark::new("weights");
        assert_eq!(mark.name(), "weights");
        assert_eq!(mark.to_string(), "weights");
        assert!(!mark.is_empty());
    }

    #[test]
    fn test_mark_equality() {
        let a = Mark::from("kv_cache");
        let b = Mark::new(String::from("kv_cache"));
        assert_eq!(a, b);
        assert_ne!(a, Mark::new("weights"));
    }

    #[test]
    fn test_empty_mark() {
        assert!(Mark::new("").is_empty());
    }

    #[test]
    fn test_backed_mode_default() {
        assert_eq!(BackedMode::default(), BackedMode::None);
    }
}
