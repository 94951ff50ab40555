//! Stage 4: Track State
//!
//! Records a document count, a document-set hash and the logical paths for
//! every configured repository. All hashes are computed before the first write
//! and cancellation is checked in between, so a canceled build leaves the
//! tracker untouched. Tracker failures never fail the build: output of the
//! current generation does not depend on tracking.
//!
//! A repository's hash covers the paths of its files inside the checkout, not
//! their logical paths. Logical paths gain or lose the repository prefix when
//! the build switches between single- and multi-repository mode, and that
//! must not count as a change to a repository whose files stayed put.
//!
//! Entries for repositories that are no longer configured are dropped, so the
//! next run does not seed its previous generation with their paths.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use super::{BuildState, RepositorySummary, Stage, StageResult};
use crate::cancel::CancellationToken;
use crate::error::{Error, StageError};
use crate::hash::{compute_signature, ChangeSignature};
use crate::state::StateTracker;

pub struct TrackStateStage;

struct Pending {
    id: String,
    logical_paths: Vec<String>,
    hash: ChangeSignature,
}

impl Stage for TrackStateStage {
    fn name(&self) -> &'static str {
        "track-state"
    }

    fn run(&self, cancel: &CancellationToken, state: &mut BuildState) -> StageResult {
        let pending = pending_writes(state);
        cancel.check()?;

        let Some(tracker) = state.collaborators.tracker.clone() else {
            debug!("No state tracker configured; skipping");
            state.repositories = pending
                .into_iter()
                .map(|p| {
                    let summary = RepositorySummary {
                        documents: p.logical_paths.len(),
                        hash: p.hash,
                        unchanged: false,
                    };
                    (p.id, summary)
                })
                .collect();
            return Ok(());
        };

        let mut failures = Vec::new();
        let mut summaries = BTreeMap::new();
        for p in pending {
            let unchanged = match stored_hash(tracker.as_ref(), &p.id) {
                Ok(stored) => stored.as_ref() == Some(&p.hash),
                Err(err) => {
                    failures.push(format!("{}: {}", p.id, err));
                    false
                }
            };
            if let Err(err) = write_repository(tracker.as_ref(), &p) {
                failures.push(format!("{}: {}", p.id, err));
            }
            summaries.insert(
                p.id,
                RepositorySummary {
                    documents: p.logical_paths.len(),
                    hash: p.hash,
                    unchanged,
                },
            );
        }

        let configured: BTreeSet<&str> = summaries.keys().map(String::as_str).collect();
        if let Err(err) = prune_unconfigured(tracker.as_ref(), &configured) {
            failures.push(format!("prune: {}", err));
        }

        if let Err(err) = tracker.flush() {
            failures.push(format!("flush: {}", err));
        }

        let unchanged = summaries.values().filter(|s| s.unchanged).count();
        info!(
            "Tracked {} repositories ({} unchanged since the last run)",
            summaries.len(),
            unchanged
        );
        state.repositories = summaries;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StageError::warn(Error::State {
                message: format!(
                    "{} tracker write(s) failed: {}",
                    failures.len(),
                    failures.join("; ")
                ),
            }))
        }
    }
}

/// Per-repository hashes for every configured repository, including those
/// that produced no documents.
fn pending_writes(state: &BuildState) -> Vec<Pending> {
    let mut grouped: BTreeMap<String, (Vec<String>, Vec<String>)> = state
        .config
        .repositories
        .iter()
        .map(|repo| (repo.id(), Default::default()))
        .collect();
    for record in state.documents.records() {
        let (logical, checkout) = grouped.entry(record.repository.clone()).or_default();
        logical.push(record.logical_path.clone());
        checkout.push(record.repository_path());
    }

    grouped
        .into_iter()
        .map(|(id, (mut logical_paths, checkout_paths))| {
            logical_paths.sort();
            let hash = compute_signature(&checkout_paths);
            Pending {
                id,
                logical_paths,
                hash,
            }
        })
        .collect()
}

fn stored_hash(tracker: &dyn StateTracker, id: &str) -> crate::error::Result<Option<ChangeSignature>> {
    Ok(tracker
        .repository(id)?
        .and_then(|state| state.document_set_hash))
}

fn write_repository(tracker: &dyn StateTracker, pending: &Pending) -> crate::error::Result<()> {
    tracker.set_document_count(&pending.id, pending.logical_paths.len())?;
    tracker.set_document_set_hash(&pending.id, &pending.hash)?;
    tracker.set_document_paths(&pending.id, &pending.logical_paths)
}

fn prune_unconfigured(
    tracker: &dyn StateTracker,
    configured: &BTreeSet<&str>,
) -> crate::error::Result<()> {
    for id in tracker.repositories()?.into_keys() {
        if !configured.contains(id.as_str()) {
            info!("Dropping state for {}, no longer configured", id);
            tracker.remove_repository(&id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentRecord, DocumentSet};
    use crate::phases::test_support::state_with;
    use crate::state::{MemoryStateTracker, RepositoryState};
    use std::sync::Arc;

    fn documents(entries: &[(&str, &str)]) -> DocumentSet {
        DocumentSet::new(
            entries
                .iter()
                .map(|(repo, path)| DocumentRecord::new(*repo, *repo, *path, Vec::new()))
                .collect(),
        )
    }

    /// Tracker whose writes always fail
    struct BrokenTracker;

    impl StateTracker for BrokenTracker {
        fn set_document_count(&self, _: &str, _: usize) -> crate::error::Result<()> {
            Err(Error::State {
                message: "read-only".to_string(),
            })
        }

        fn set_document_set_hash(&self, _: &str, _: &ChangeSignature) -> crate::error::Result<()> {
            Ok(())
        }

        fn remove_repository(&self, _: &str) -> crate::error::Result<()> {
            Ok(())
        }

        fn repository(&self, _: &str) -> crate::error::Result<Option<RepositoryState>> {
            Ok(None)
        }

        fn repositories(&self) -> crate::error::Result<BTreeMap<String, RepositoryState>> {
            Ok(BTreeMap::new())
        }
    }

    #[test]
    fn test_records_every_repository() {
        let tracker = Arc::new(MemoryStateTracker::new());
        let mut state = state_with(&[], &["r1", "r2", "r3"]);
        state.collaborators.tracker = Some(tracker.clone());
        state.documents = documents(&[("r1", "a.md"), ("r1", "b.md"), ("r2", "c.md")]);

        TrackStateStage
            .run(&CancellationToken::new(), &mut state)
            .unwrap();

        let r1 = tracker.repository("r1").unwrap().unwrap();
        assert_eq!(r1.document_count, 2);
        assert_eq!(
            r1.document_set_hash,
            Some(compute_signature(["a.md", "b.md"]))
        );
        assert_eq!(
            r1.document_paths,
            Some(vec!["r1/a.md".to_string(), "r1/b.md".to_string()])
        );

        // A configured repository without documents still gets an entry.
        let r3 = tracker.repository("r3").unwrap().unwrap();
        assert_eq!(r3.document_count, 0);
        assert_eq!(r3.document_set_hash, Some(compute_signature(Vec::<String>::new())));
        assert_eq!(state.repositories.len(), 3);
    }

    #[test]
    fn test_unchanged_repositories_are_reported() {
        let tracker = Arc::new(MemoryStateTracker::new());
        tracker
            .set_document_set_hash("r1", &compute_signature(["a.md"]))
            .unwrap();

        let mut state = state_with(&[], &["r1", "r2"]);
        state.collaborators.tracker = Some(tracker);
        state.documents = documents(&[("r1", "a.md"), ("r2", "b.md")]);
        TrackStateStage
            .run(&CancellationToken::new(), &mut state)
            .unwrap();

        assert!(state.repositories["r1"].unchanged);
        assert!(!state.repositories["r2"].unchanged);
    }

    #[test]
    fn test_canceled_before_writes_leaves_tracker_empty() {
        let tracker = Arc::new(MemoryStateTracker::new());
        let mut state = state_with(&[], &["r1"]);
        state.collaborators.tracker = Some(tracker.clone());
        state.documents = documents(&[("r1", "a.md")]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = TrackStateStage.run(&cancel, &mut state).unwrap_err();
        assert!(err.is_canceled());
        assert!(tracker.is_empty().unwrap());
    }

    #[test]
    fn test_absent_tracker_still_summarizes() {
        let mut state = state_with(&[], &["r1"]);
        state.documents = documents(&[("r1", "a.md")]);
        TrackStateStage
            .run(&CancellationToken::new(), &mut state)
            .unwrap();
        assert_eq!(state.repositories["r1"].documents, 1);
        assert!(!state.repositories["r1"].unchanged);
    }

    #[test]
    fn test_tracker_failure_is_a_warning() {
        let mut state = state_with(&[], &["r1"]);
        state.collaborators.tracker = Some(Arc::new(BrokenTracker));
        state.documents = documents(&[("r1", "a.md")]);

        let err = TrackStateStage
            .run(&CancellationToken::new(), &mut state)
            .unwrap_err();
        assert!(err.is_warning());
        assert!(err.cause.to_string().contains("read-only"));
        assert_eq!(state.repositories.len(), 1);
    }

    #[test]
    fn test_hash_ignores_single_repository_mode_switch() {
        let tracker = Arc::new(MemoryStateTracker::new());
        let mut state = state_with(&[], &["r1", "r2"]);
        state.collaborators.tracker = Some(tracker.clone());
        state.documents = documents(&[("r1", "a.md"), ("r1", "b.md"), ("r2", "c.md")]);
        TrackStateStage
            .run(&CancellationToken::new(), &mut state)
            .unwrap();
        let r2_multi = tracker.repository("r2").unwrap().unwrap();
        assert_eq!(r2_multi.document_paths, Some(vec!["r2/c.md".to_string()]));

        // r1 loses every file; r2 is now the only repository with documents.
        state.documents = documents(&[("r2", "c.md")]);
        assert!(state.documents.is_single_repository());
        TrackStateStage
            .run(&CancellationToken::new(), &mut state)
            .unwrap();

        let r2_single = tracker.repository("r2").unwrap().unwrap();
        assert_eq!(r2_single.document_set_hash, r2_multi.document_set_hash);
        assert_eq!(r2_single.document_paths, Some(vec!["c.md".to_string()]));
        assert!(state.repositories["r2"].unchanged);
        assert!(!state.repositories["r1"].unchanged);
        assert_eq!(tracker.repository("r1").unwrap().unwrap().document_count, 0);
    }

    #[test]
    fn test_unconfigured_repositories_are_dropped() {
        let tracker = Arc::new(MemoryStateTracker::new());
        tracker.set_document_count("gone", 3).unwrap();
        tracker
            .set_document_paths("gone", &["gone/x.md".to_string()])
            .unwrap();

        let mut state = state_with(&[], &["r1"]);
        state.collaborators.tracker = Some(tracker.clone());
        state.documents = documents(&[("r1", "a.md")]);
        TrackStateStage
            .run(&CancellationToken::new(), &mut state)
            .unwrap();

        assert!(tracker.repository("gone").unwrap().is_none());
        let ids: Vec<String> = tracker.repositories().unwrap().into_keys().collect();
        assert_eq!(ids, vec!["r1".to_string()]);
    }

    #[test]
    fn test_canceled_build_keeps_unconfigured_entries() {
        let tracker = Arc::new(MemoryStateTracker::new());
        tracker.set_document_count("gone", 1).unwrap();
        let mut state = state_with(&[], &["r1"]);
        state.collaborators.tracker = Some(tracker.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(TrackStateStage.run(&cancel, &mut state).is_err());
        assert!(tracker.repository("gone").unwrap().is_some());
    }
}
