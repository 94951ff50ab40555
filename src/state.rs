//! Incremental build state, keyed by repository identity
//!
//! The pipeline writes a document count, a document-set hash and (optionally)
//! the logical paths for every repository after discovery. Nothing in the
//! current generation reads these values back; they let a later run decide
//! whether a repository changed since it was last built.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::document::DocumentSet;
use crate::error::{Error, Result};
use crate::hash::ChangeSignature;

/// Version tag written into state files
const STATE_VERSION: u32 = 1;

/// Everything tracked for one repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryState {
    pub document_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_set_hash: Option<ChangeSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_paths: Option<Vec<String>>,
}

/// Keyed store the pipeline records per-repository summaries into.
///
/// Writes for different repositories touch disjoint keys.
pub trait StateTracker: Send + Sync {
    fn set_document_count(&self, repo_id: &str, count: usize) -> Result<()>;

    fn set_document_set_hash(&self, repo_id: &str, signature: &ChangeSignature) -> Result<()>;

    /// Optional; trackers that don't keep paths ignore the call.
    fn set_document_paths(&self, _repo_id: &str, _paths: &[String]) -> Result<()> {
        Ok(())
    }

    /// Forget everything recorded for `repo_id`. Unknown ids are ignored.
    fn remove_repository(&self, repo_id: &str) -> Result<()>;

    /// State recorded by an earlier run, if any.
    fn repository(&self, repo_id: &str) -> Result<Option<RepositoryState>>;

    /// Every tracked repository, in identity order.
    fn repositories(&self) -> Result<BTreeMap<String, RepositoryState>>;

    /// Persist pending writes.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Reconstruct the previous generation's document set from tracked paths.
///
/// Repositories tracked without paths contribute nothing.
pub fn previous_generation(tracker: &dyn StateTracker) -> Result<DocumentSet> {
    let repositories = tracker.repositories()?;
    let entries = repositories.into_iter().flat_map(|(id, state)| {
        state
            .document_paths
            .unwrap_or_default()
            .into_iter()
            .map(move |path| (id.clone(), path))
    });
    Ok(DocumentSet::from_tracked(entries))
}

/// In-process tracker
#[derive(Debug, Clone, Default)]
pub struct MemoryStateTracker {
    entries: Arc<Mutex<BTreeMap<String, RepositoryState>>>,
}

impl MemoryStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_entries(entries: BTreeMap<String, RepositoryState>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, RepositoryState>>> {
        self.entries.lock().map_err(|_| Error::State {
            message: "state tracker lock poisoned".to_string(),
        })
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }
}

impl StateTracker for MemoryStateTracker {
    fn set_document_count(&self, repo_id: &str, count: usize) -> Result<()> {
        self.lock()?
            .entry(repo_id.to_string())
            .or_default()
            .document_count = count;
        Ok(())
    }

    fn set_document_set_hash(&self, repo_id: &str, signature: &ChangeSignature) -> Result<()> {
        self.lock()?
            .entry(repo_id.to_string())
            .or_default()
            .document_set_hash = Some(signature.clone());
        Ok(())
    }

    fn set_document_paths(&self, repo_id: &str, paths: &[String]) -> Result<()> {
        self.lock()?
            .entry(repo_id.to_string())
            .or_default()
            .document_paths = Some(paths.to_vec());
        Ok(())
    }

    fn remove_repository(&self, repo_id: &str) -> Result<()> {
        self.lock()?.remove(repo_id);
        Ok(())
    }

    fn repository(&self, repo_id: &str) -> Result<Option<RepositoryState>> {
        Ok(self.lock()?.get(repo_id).cloned())
    }

    fn repositories(&self) -> Result<BTreeMap<String, RepositoryState>> {
        Ok(self.lock()?.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    repositories: BTreeMap<String, RepositoryState>,
}

/// Tracker persisted as a JSON file
///
/// Writes accumulate in memory and reach disk on [`StateTracker::flush`],
/// which replaces the file through a temporary sibling and a rename.
#[derive(Debug, Clone)]
pub struct FileStateTracker {
    path: PathBuf,
    inner: MemoryStateTracker,
}

impl FileStateTracker {
    /// Load `path`, or start empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let file: StateFile = serde_json::from_str(&content).map_err(|err| Error::State {
                message: format!("failed to read {}: {}", path.display(), err),
            })?;
            if file.version != STATE_VERSION {
                return Err(Error::State {
                    message: format!(
                        "unsupported state version {} in {} (expected {})",
                        file.version,
                        path.display(),
                        STATE_VERSION
                    ),
                });
            }
            file.repositories
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            inner: MemoryStateTracker::from_entries(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateTracker for FileStateTracker {
    fn set_document_count(&self, repo_id: &str, count: usize) -> Result<()> {
        self.inner.set_document_count(repo_id, count)
    }

    fn set_document_set_hash(&self, repo_id: &str, signature: &ChangeSignature) -> Result<()> {
        self.inner.set_document_set_hash(repo_id, signature)
    }

    fn set_document_paths(&self, repo_id: &str, paths: &[String]) -> Result<()> {
        self.inner.set_document_paths(repo_id, paths)
    }

    fn remove_repository(&self, repo_id: &str) -> Result<()> {
        self.inner.remove_repository(repo_id)
    }

    fn repository(&self, repo_id: &str) -> Result<Option<RepositoryState>> {
        self.inner.repository(repo_id)
    }

    fn repositories(&self) -> Result<BTreeMap<String, RepositoryState>> {
        self.inner.repositories()
    }

    fn flush(&self) -> Result<()> {
        let file = StateFile {
            version: STATE_VERSION,
            repositories: self.inner.repositories()?,
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compute_signature;

    #[test]
    fn test_memory_tracker_records_per_repository() {
        let tracker = MemoryStateTracker::new();
        assert!(tracker.is_empty().unwrap());

        let signature = compute_signature(["a.md"]);
        tracker.set_document_count("r1", 1).unwrap();
        tracker.set_document_set_hash("r1", &signature).unwrap();
        tracker.set_document_count("r2", 4).unwrap();

        assert_eq!(tracker.len().unwrap(), 2);
        let r1 = tracker.repository("r1").unwrap().unwrap();
        assert_eq!(r1.document_count, 1);
        assert_eq!(r1.document_set_hash, Some(signature));
        assert!(r1.document_paths.is_none());
        assert!(tracker.repository("missing").unwrap().is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let tracker = MemoryStateTracker::new();
        let clone = tracker.clone();
        clone.set_document_count("r1", 3).unwrap();
        assert_eq!(tracker.repository("r1").unwrap().unwrap().document_count, 3);
    }

    #[test]
    fn test_file_tracker_round_trip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.json");

        let tracker = FileStateTracker::open(&path).unwrap();
        assert!(tracker.repositories().unwrap().is_empty());
        tracker.set_document_count("r1", 2).unwrap();
        tracker
            .set_document_set_hash("r1", &compute_signature(["a.md", "b.md"]))
            .unwrap();
        tracker
            .set_document_paths("r1", &["a.md".to_string(), "b.md".to_string()])
            .unwrap();
        tracker.flush().unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = FileStateTracker::open(&path).unwrap();
        assert_eq!(
            reopened.repository("r1").unwrap(),
            tracker.repository("r1").unwrap()
        );
    }

    #[test]
    fn test_removed_repository_is_gone_after_flush() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("state.json");

        let tracker = FileStateTracker::open(&path).unwrap();
        tracker.set_document_count("r1", 1).unwrap();
        tracker.set_document_count("r2", 1).unwrap();
        tracker.flush().unwrap();

        tracker.remove_repository("r2").unwrap();
        tracker.remove_repository("never-tracked").unwrap();
        tracker.flush().unwrap();

        let reopened = FileStateTracker::open(&path).unwrap();
        let ids: Vec<String> = reopened.repositories().unwrap().into_keys().collect();
        assert_eq!(ids, vec!["r1".to_string()]);
    }

    #[test]
    fn test_file_tracker_rejects_unknown_version() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs::write(&path, r#"{"version": 99, "repositories": {}}"#).unwrap();
        let err = FileStateTracker::open(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported state version"));
    }

    #[test]
    fn test_file_tracker_rejects_corrupt_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileStateTracker::open(&path),
            Err(Error::State { .. })
        ));
    }

    #[test]
    fn test_previous_generation_from_tracked_paths() {
        let tracker = MemoryStateTracker::new();
        tracker
            .set_document_paths("r1", &["r1/a.md".to_string()])
            .unwrap();
        tracker
            .set_document_paths("r2", &["r2/b.md".to_string()])
            .unwrap();
        tracker.set_document_count("r3", 0).unwrap();

        let previous = previous_generation(&tracker).unwrap();
        assert_eq!(previous.len(), 2);
        assert_eq!(previous.logical_paths(), vec!["r1/a.md", "r2/b.md"]);
    }
}
