//! Structural change detection between two generations
//!
//! [`detect_changes`] answers "did the set of logical paths change?". It does
//! not compare document contents: a generation whose files were edited in
//! place, without adding, removing or renaming any of them, reports no change.

use log::debug;

use crate::document::DocumentSet;

/// Report whether `current` differs structurally from `previous`.
///
/// - An empty `previous` (first generation) reports no change; callers treat
///   a first generation as needing full processing through their own check.
/// - Different sizes report a change without comparing paths.
/// - Otherwise the two path sets are compared, each derived under its own
///   single/multi-repository mode. Record order is irrelevant.
pub fn detect_changes(previous: &DocumentSet, current: &DocumentSet) -> bool {
    if previous.is_empty() {
        return false;
    }

    if previous.len() != current.len() {
        debug!(
            "Document count changed: {} -> {}",
            previous.len(),
            current.len()
        );
        return true;
    }

    let before = previous.path_set();
    let after = current.path_set();
    if before == after {
        return false;
    }

    if log::log_enabled!(log::Level::Debug) {
        let added = after.difference(&before).count();
        let removed = before.difference(&after).count();
        debug!(
            "Document paths changed: {} added, {} removed",
            added, removed
        );
    }
    true
}
