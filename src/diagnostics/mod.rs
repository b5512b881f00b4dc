//! Diagnostics for routing misuse.
//!
//! Scope-discipline bugs often surface where the API cannot return a
//! `Result` (guard drops). This module gives them a visible channel:
//! coded diagnostics emitted to stderr (and optionally the `log` crate),
//! with a strict mode that escalates them to panics.

pub mod emit;
pub mod kind;
pub mod strict;

pub use emit::{emit, emit_with_context, is_suppressed, suppress_diagnostics};
pub use kind::{Diagnostic, DiagnosticKind, MA001, MA002, MA101, MA201, MA901};
pub use strict::{set_strict_mode, strict_mode, StrictMode, StrictModeGuard};
