// src/diff/mod.rs

//! Line-oriented comparison of two snapshots.
//!
//! The verdict is derived from the hunks of a unified diff, never from the
//! patch header: two snapshots differ iff the diff has at least one hunk.

use similar::TextDiff;

/// File name used on both sides of the `---` / `+++` patch header.
pub const PATCH_LABEL: &str = "content";

/// Unchanged lines kept around each change in a hunk.
pub const CONTEXT_LINES: usize = 4;

/// Result of comparing a previous snapshot against a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Unified diff text; present only when `changed` is true.
    pub patch: Option<String>,
    /// True iff the two snapshots differ by at least one line.
    pub changed: bool,
}

impl Comparison {
    fn unchanged() -> Self {
        Self {
            patch: None,
            changed: false,
        }
    }
}

/// Compare `previous` against `current`.
///
/// An absent `previous` is a baseline observation and never counts as a
/// change. Pure and deterministic.
pub fn compare(previous: Option<&str>, current: &str) -> Comparison {
    let Some(previous) = previous else {
        return Comparison::unchanged();
    };

    if previous == current {
        return Comparison::unchanged();
    }

    let diff = TextDiff::from_lines(previous, current);

    let mut unified = diff.unified_diff();
    unified
        .context_radius(CONTEXT_LINES)
        .header(PATCH_LABEL, PATCH_LABEL);

    if unified.iter_hunks().next().is_none() {
        return Comparison::unchanged();
    }

    Comparison {
        patch: Some(unified.to_string()),
        changed: true,
    }
}
