//! Discovered documentation files and the per-generation document set

use std::collections::{BTreeMap, BTreeSet};

use crate::hash::{compute_signature, ChangeSignature};

/// One discovered documentation file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Repository identity (canonical URL or checkout path)
    pub repository: String,
    /// Human-readable repository name, used as the path prefix in multi-repository builds
    pub repository_name: String,
    /// Path relative to the docs directory it was found in, `/`-separated
    pub relative_path: String,
    /// Docs directory (relative to the checkout) the file was found in
    pub docs_dir: String,
    /// Destination path in the generated site
    pub logical_path: String,
    /// File content as read from disk
    pub raw_content: Vec<u8>,
    /// Content after page assembly; empty until the assemble stage runs
    pub transformed_content: Vec<u8>,
}

impl DocumentRecord {
    pub fn new(
        repository: impl Into<String>,
        repository_name: impl Into<String>,
        relative_path: impl Into<String>,
        raw_content: Vec<u8>,
    ) -> Self {
        let relative_path = normalize_path(&relative_path.into());
        Self {
            repository: repository.into(),
            repository_name: repository_name.into(),
            logical_path: relative_path.clone(),
            relative_path,
            docs_dir: String::new(),
            raw_content,
            transformed_content: Vec::new(),
        }
    }

    /// Set the docs directory this record was discovered under.
    pub fn with_docs_dir(mut self, docs_dir: impl Into<String>) -> Self {
        self.docs_dir = normalize_path(&docs_dir.into());
        self
    }

    /// Path of the file inside its repository checkout.
    pub fn repository_path(&self) -> String {
        if self.docs_dir.is_empty() {
            self.relative_path.clone()
        } else {
            format!("{}/{}", self.docs_dir, self.relative_path)
        }
    }

    /// File name without directories or extension.
    pub fn stem(&self) -> &str {
        let name = self
            .relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path);
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }
}

/// Derive the logical path for a record.
pub fn derive_logical_path(record: &DocumentRecord, single_repository: bool) -> String {
    if single_repository {
        record.relative_path.clone()
    } else {
        format!("{}/{}", record.repository_name, record.relative_path)
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// All documents discovered in one generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet {
    records: Vec<DocumentRecord>,
    single_repository: bool,
}

impl DocumentSet {
    /// Build a set from freshly discovered records, deriving logical paths.
    pub fn new(mut records: Vec<DocumentRecord>) -> Self {
        let single_repository = count_repositories(&records) == 1;
        for record in &mut records {
            record.logical_path = derive_logical_path(record, single_repository);
        }
        Self {
            records,
            single_repository,
        }
    }

    /// Rebuild a set from `(repository, logical path)` pairs persisted by an
    /// earlier run. Only paths are known; contents are empty.
    pub fn from_tracked<I, R, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (R, P)>,
        R: Into<String>,
        P: Into<String>,
    {
        let records: Vec<DocumentRecord> = entries
            .into_iter()
            .map(|(repository, path)| {
                let repository = repository.into();
                let path = path.into();
                DocumentRecord {
                    repository_name: repository.clone(),
                    repository,
                    relative_path: path.clone(),
                    docs_dir: String::new(),
                    logical_path: path,
                    raw_content: Vec::new(),
                    transformed_content: Vec::new(),
                }
            })
            .collect();
        let single_repository = count_repositories(&records) == 1;
        Self {
            records,
            single_repository,
        }
    }

    pub fn is_single_repository(&self) -> bool {
        self.single_repository
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [DocumentRecord] {
        &mut self.records
    }

    /// Logical paths in record order.
    pub fn logical_paths(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.logical_path.as_str()).collect()
    }

    /// Logical paths as a set, for comparisons.
    pub fn path_set(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.logical_path.as_str()).collect()
    }

    /// Records grouped by repository identity, in identity order.
    pub fn by_repository(&self) -> BTreeMap<&str, Vec<&DocumentRecord>> {
        let mut grouped: BTreeMap<&str, Vec<&DocumentRecord>> = BTreeMap::new();
        for record in &self.records {
            grouped
                .entry(record.repository.as_str())
                .or_default()
                .push(record);
        }
        grouped
    }

    /// Signature over every logical path in the set (the build's `DocFilesHash`).
    pub fn signature(&self) -> ChangeSignature {
        compute_signature(self.logical_paths())
    }
}

fn count_repositories(records: &[DocumentRecord]) -> usize {
    records
        .iter()
        .map(|r| r.repository.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}
