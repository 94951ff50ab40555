//! Persisted summary of a build
//!
//! One [`BuildReport`] is produced per generation, whatever its outcome, and
//! written as `build-report.json` in the output root. `doc_files_hash` is the
//! generation-level change signature over every logical path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::REPORT_FILE;
use crate::error::{Result, StageError, StageErrorKind};
use crate::hash::ChangeSignature;

/// Terminal classification of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStatus {
    Success,
    Failed,
    Canceled,
}

impl From<Option<&StageError>> for BuildStatus {
    fn from(terminal: Option<&StageError>) -> Self {
        match terminal.map(|err| err.kind) {
            None | Some(StageErrorKind::Warn) => BuildStatus::Success,
            Some(StageErrorKind::Fatal) => BuildStatus::Failed,
            Some(StageErrorKind::Canceled) => BuildStatus::Canceled,
        }
    }
}

/// What happened to one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    Completed,
    Warned,
    Failed,
    Canceled,
    /// Not run because an earlier stage halted the pipeline
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: String,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StageRecord {
    pub fn new(name: &str, status: StageStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: None,
        }
    }

    pub fn with_error(name: &str, status: StageStatus, error: &StageError) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(error.cause.to_string()),
        }
    }
}

/// Per-repository summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryReport {
    pub id: String,
    pub documents: usize,
    pub hash: ChangeSignature,
    /// Stored hash from the previous run matched
    pub unchanged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub status: BuildStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_files_hash: Option<ChangeSignature>,
    pub documents: usize,
    pub first_generation: bool,
    pub changed: bool,
    pub rendered: bool,
    pub repositories: Vec<RepositoryReport>,
    pub stages: Vec<StageRecord>,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl BuildReport {
    /// Location of the report inside `output_root`.
    pub fn path_in(output_root: &Path) -> PathBuf {
        output_root.join(REPORT_FILE)
    }

    pub fn write(&self, output_root: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_root)?;
        let path = Self::path_in(output_root);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn read(output_root: &Path) -> Result<Self> {
        let content = fs::read_to_string(Self::path_in(output_root))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Success
    }
}
