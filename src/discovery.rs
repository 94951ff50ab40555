//! Discovery of documentation files in local repository checkouts
//!
//! ## Process
//!
//! 1.  **Walk**: every configured docs directory of every repository is walked
//!     with `walkdir`, skipping hidden directories such as `.git`.
//!
//! 2.  **Filter**: files relative to their docs directory are kept when they
//!     match an include pattern and no exclude pattern.
//!
//! 3.  **Read**: the selected files are read in parallel with `rayon`. This is
//!     the only parallel work in a build and it completes before the document
//!     set is handed to the pipeline.
//!
//! 4.  **Derive**: records are sorted by repository and path and wrapped in a
//!     [`DocumentSet`], which derives logical paths. When two files derive the
//!     same logical path the first one (in sorted order) is kept.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};
use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::cancel::CancellationToken;
use crate::config::{BuildConfig, RepositoryConfig};
use crate::document::{DocumentRecord, DocumentSet};
use crate::error::{Error, Result};

/// Produces the document set for a generation.
pub trait Discoverer: Send + Sync {
    fn discover(
        &self,
        repositories: &[RepositoryConfig],
        cancel: &CancellationToken,
    ) -> Result<DocumentSet>;
}

/// Discovers Markdown files in local checkouts
#[derive(Debug, Clone)]
pub struct FsDiscoverer {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

struct Candidate {
    repository: String,
    repository_name: String,
    docs_dir: String,
    relative_path: String,
    full_path: PathBuf,
}

impl FsDiscoverer {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        Self::new(&config.include, &config.exclude)
    }

    fn selects(&self, relative_path: &str) -> bool {
        self.include.iter().any(|p| p.matches(relative_path))
            && !self.exclude.iter().any(|p| p.matches(relative_path))
    }

    fn collect_candidates(
        &self,
        repo: &RepositoryConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let id = repo.id();
        if !repo.path.is_dir() {
            return Err(Error::Discovery {
                repository: id,
                message: format!("checkout not found at {}", repo.path.display()),
            });
        }

        let name = repo.display_name();
        let mut candidates = Vec::new();
        for docs_dir in &repo.docs {
            cancel.check()?;
            let root = repo.path.join(docs_dir);
            if !root.is_dir() {
                return Err(Error::Discovery {
                    repository: id,
                    message: format!("docs directory '{}' not found", docs_dir),
                });
            }

            let walker = WalkDir::new(&root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
            for entry in walker {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative_path = relative_to(&root, entry.path());
                if !self.selects(&relative_path) {
                    debug!("{}: skipping {}", name, relative_path);
                    continue;
                }
                candidates.push(Candidate {
                    repository: id.clone(),
                    repository_name: name.clone(),
                    docs_dir: docs_dir.clone(),
                    relative_path,
                    full_path: entry.into_path(),
                });
            }
        }
        Ok(candidates)
    }
}

impl Discoverer for FsDiscoverer {
    fn discover(
        &self,
        repositories: &[RepositoryConfig],
        cancel: &CancellationToken,
    ) -> Result<DocumentSet> {
        if repositories.is_empty() {
            return Err(Error::Validation {
                message: "no repositories supplied to discovery".to_string(),
            });
        }

        let mut candidates = Vec::new();
        for repo in repositories {
            cancel.check()?;
            candidates.extend(self.collect_candidates(repo, cancel)?);
        }
        cancel.check()?;

        let mut records = candidates
            .par_iter()
            .map(|candidate| {
                let content = fs::read(&candidate.full_path).map_err(|err| Error::Discovery {
                    repository: candidate.repository.clone(),
                    message: format!("failed to read {}: {}", candidate.full_path.display(), err),
                })?;
                Ok(DocumentRecord::new(
                    candidate.repository.clone(),
                    candidate.repository_name.clone(),
                    candidate.relative_path.clone(),
                    content,
                )
                .with_docs_dir(candidate.docs_dir.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        records.sort_by(|a, b| {
            (a.repository.as_str(), a.relative_path.as_str())
                .cmp(&(b.repository.as_str(), b.relative_path.as_str()))
        });
        Ok(dedupe(DocumentSet::new(records)))
    }
}

/// Keep the first record for every logical path.
fn dedupe(set: DocumentSet) -> DocumentSet {
    if set.path_set().len() == set.len() {
        return set;
    }

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(set.len());
    for record in set.records() {
        if seen.insert(record.logical_path.clone()) {
            kept.push(record.clone());
        } else {
            warn!(
                "{}: '{}' derives the already-used path '{}'; keeping the first",
                record.repository,
                record.repository_path(),
                record.logical_path
            );
        }
    }
    DocumentSet::new(kept)
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(Error::Glob))
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn relative_to(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
