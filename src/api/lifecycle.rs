//! Bulk lifecycle operations over marks.
//!
//! Release and materialize are structurally symmetric: each asks the
//! manager to process every blob under each given mark and sums the
//! per-mark counts. Marks are logically independent; the order they are
//! processed in is unspecified.

use crate::api::error::RouteError;
use crate::core::{adapter, global};

#[derive(Clone, Copy)]
enum LifecycleOp {
    Release,
    Materialize,
}

/// Release every memory blob allocated under the given marks.
///
/// Returns the total number of blobs released. Idempotent per mark: a
/// mark with no outstanding blobs contributes 0. Zero marks is a no-op
/// returning 0. The first manager error aborts processing of the
/// remaining marks.
pub fn release_with_marks<I>(marks: I) -> Result<usize, RouteError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    run_lifecycle(marks, LifecycleOp::Release)
}

/// Materialize every outstanding memory blob under the given marks,
/// backing each with real content according to its recorded mode.
///
/// Returns the total number of blobs materialized. Zero marks is a no-op
/// returning 0. The first manager error aborts processing of the
/// remaining marks.
pub fn materialize_with_marks<I>(marks: I) -> Result<usize, RouteError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    run_lifecycle(marks, LifecycleOp::Materialize)
}

fn run_lifecycle<I>(marks: I, op: LifecycleOp) -> Result<usize, RouteError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut marks = marks.into_iter().peekable();
    if marks.peek().is_none() {
        return Ok(0);
    }

    let rt = global::runtime()?;
    // Individually freed blobs must leave the manager before a by-mark
    // sweep counts them.
    adapter::drain_foreign_frees()?;

    let mut total = 0;
    for mark in marks {
        let mark = mark.as_ref();
        let count = match op {
            LifecycleOp::Release => rt.manager().release_with_mark(mark)?,
            LifecycleOp::Materialize => rt.manager().materialize_with_mark(mark)?,
        };
        match op {
            LifecycleOp::Release => rt.stats().record_released(count),
            LifecycleOp::Materialize => rt.stats().record_materialized(count),
        }
        total += count;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_marks_is_noop() {
        // No runtime is bound in lib tests; an empty mark set must still
        // succeed without touching it.
        let marks: [&str; 0] = [];
        assert_eq!(release_with_marks(marks).unwrap(), 0);
        assert_eq!(materialize_with_marks(marks).unwrap(), 0);
    }

    #[test]
    fn test_nonempty_marks_require_runtime() {
        let err = release_with_marks(["weights"]).unwrap_err();
        assert!(matches!(err, RouteError::Configuration(_)));
    }
}
