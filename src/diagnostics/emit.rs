//! Diagnostic emission backend.
//!
//! Routing misuse often surfaces where no `Result` can flow (guard drops,
//! foreign-thread frees). It is reported here: to stderr, optionally to
//! the `log` crate, and - under strict mode - as a panic.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use super::kind::{Diagnostic, DiagnosticKind};
use super::strict::{should_panic, should_panic_on_warning};

/// Global flag to suppress diagnostic output (for testing).
static DIAGNOSTICS_SUPPRESSED: AtomicBool = AtomicBool::new(false);

/// Suppress all diagnostic output.
pub fn suppress_diagnostics(suppress: bool) {
    DIAGNOSTICS_SUPPRESSED.store(suppress, Ordering::Relaxed);
}

/// Check if diagnostics are suppressed.
pub fn is_suppressed() -> bool {
    DIAGNOSTICS_SUPPRESSED.load(Ordering::Relaxed)
}

/// Emit a diagnostic.
///
/// Emits to stderr in debug builds (always with the `diagnostics`
/// feature), then panics if strict mode demands it for the diagnostic's
/// kind. The panic is skipped when the thread is already unwinding - many
/// diagnostics fire from guard teardown, and a second panic there would
/// abort the process.
pub fn emit(diag: &Diagnostic) {
    emit_with_context(diag, None);
}

/// Emit a diagnostic with additional runtime context.
pub fn emit_with_context(diag: &Diagnostic, context: Option<&str>) {
    if !is_suppressed() {
        #[cfg(any(debug_assertions, feature = "diagnostics"))]
        write_to_stderr(diag, context);

        #[cfg(feature = "log")]
        emit_to_log(diag, context);
    }

    let strict = match diag.kind {
        DiagnosticKind::Error => should_panic(),
        DiagnosticKind::Warning => should_panic_on_warning(),
        DiagnosticKind::Note => false,
    };
    if strict && !std::thread::panicking() {
        panic!(
            "[markalloc][{}] {}{}\nstrict mode enabled - diagnostics are fatal",
            diag.code,
            diag.message,
            context.map(|c| format!(" ({})", c)).unwrap_or_default(),
        );
    }
}

#[cfg(any(debug_assertions, feature = "diagnostics"))]
fn write_to_stderr(diag: &Diagnostic, context: Option<&str>) {
    let mut stderr = std::io::stderr();

    let _ = writeln!(
        stderr,
        "[markalloc][{}] {}: {}",
        diag.code,
        diag.kind.prefix(),
        diag.message
    );
    if let Some(context) = context {
        let _ = writeln!(stderr, "  context: {}", context);
    }
    if let Some(note) = diag.note {
        let _ = writeln!(stderr, "  note: {}", note);
    }
    if let Some(help) = diag.help {
        let _ = writeln!(stderr, "  help: {}", help);
    }
}

/// Forward a diagnostic to the `log` crate.
#[cfg(feature = "log")]
fn emit_to_log(diag: &Diagnostic, context: Option<&str>) {
    let context = context.unwrap_or("");
    match diag.kind {
        DiagnosticKind::Error => log::error!("[{}] {} {}", diag.code, diag.message, context),
        DiagnosticKind::Warning => log::warn!("[{}] {} {}", diag.code, diag.message, context),
        DiagnosticKind::Note => log::info!("[{}] {} {}", diag.code, diag.message, context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::kind::MA201;

    #[test]
    fn test_suppression_flag() {
        suppress_diagnostics(true);
        assert!(is_suppressed());
        emit(&MA201);
        suppress_diagnostics(false);
        assert!(!is_suppressed());
    }

    #[test]
    fn test_notes_never_panic() {
        let _guard = crate::diagnostics::StrictModeGuard::new(
            crate::diagnostics::StrictMode::PanicOnWarning,
        );
        suppress_diagnostics(true);
        emit(&MA201);
        suppress_diagnostics(false);
    }
}
