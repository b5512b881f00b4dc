//! Diagnostic kinds and the predefined code table.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A hard error - something is definitely wrong.
    Error,
    /// A warning - something is probably wrong or suboptimal.
    Warning,
    /// Additional context about another diagnostic.
    Note,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note => "note",
        }
    }
}

/// A diagnostic message with code, message, and optional context.
///
/// Diagnostic codes follow the pattern:
/// - `MA0xx` - Routing stack discipline
/// - `MA1xx` - Scope lifecycle
/// - `MA2xx` - Threading / deferred frees
/// - `MA9xx` - Internal errors
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "MA001").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Create a new note diagnostic.
    pub const fn note(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Note,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Add a note to this diagnostic.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (MA0xx - Routing stack discipline)
// =============================================================================

/// MA001: Routing stack popped with no matching push.
pub const MA001: Diagnostic = Diagnostic::error(
    "MA001",
    "routing stack popped with no matching push"
).with_note("every pop must correspond to a prior push on the same thread")
 .with_help("open allocations through scope() so push and pop are paired automatically");

/// MA002: Routing entries popped out of order.
pub const MA002: Diagnostic = Diagnostic::error(
    "MA002",
    "routing entries popped out of LIFO order"
).with_note("a scope guard outlived a scope opened after it")
 .with_help("keep inner ScopeGuards strictly inside the lifetime of outer ones");

// =============================================================================
// Predefined diagnostics (MA1xx - Scope lifecycle)
// =============================================================================

/// MA101: Scope teardown failed while dropping the guard.
pub const MA101: Diagnostic = Diagnostic::error(
    "MA101",
    "scope teardown reported an error during drop"
).with_note("routing state was still restored as far as possible")
 .with_help("call ScopeGuard::close() to receive teardown errors as a Result, or drain take_teardown_errors()");

// =============================================================================
// Predefined diagnostics (MA2xx - Threading / deferred frees)
// =============================================================================

/// MA201: Free arrived on a thread with no active scope.
pub const MA201: Diagnostic = Diagnostic::note(
    "MA201",
    "routed free arrived on a foreign thread and was deferred"
).with_note("the free is parked until the next scope boundary or lifecycle operation")
 .with_help("disable RouterConfig::defer_foreign_frees to forward foreign frees immediately");

// =============================================================================
// Predefined diagnostics (MA9xx - Internal)
// =============================================================================

/// MA901: Active-pool bookkeeping out of sync.
pub const MA901: Diagnostic = Diagnostic::error(
    "MA901",
    "active allocation pool did not match the closing scope"
).with_note("this indicates a bug in markalloc or unsound use of scope internals")
 .with_help("please report this issue at the markalloc repository");
