//! # Error Handling
//!
//! This module defines the centralized error handling for `docbuilder`. It
//! uses `thiserror` to build a single `Error` enum covering every failure the
//! library anticipates, plus the stage-level classification used by the
//! pipeline orchestrator.
//!
//! ## Key Components
//!
//! - **`Error`**: Every failure the library can report. Variants carry the
//!   context needed to diagnose the problem (repository identifiers, paths).
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! - **`StageErrorKind`**: How a pipeline stage's failure affects the build:
//!   `Warn` (logged, build continues), `Fatal` (build stops) or `Canceled`
//!   (cancellation observed, build stops without being reported as a defect).
//!
//! - **`StageError`**: A classified failure carrying the originating stage's
//!   name and the underlying `Error`.
//!
//! Type-mismatched front matter merges are never errors: the newer value
//! replaces the older one (see `frontmatter::merge`).

use std::fmt;

use thiserror::Error;

/// Main error type for docbuilder operations
#[derive(Error, Debug)]
pub enum Error {
    /// The build inputs are invalid (e.g. no repositories configured).
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The discovery collaborator failed to produce a document set.
    #[error("Discovery error for {repository}: {message}")]
    Discovery { repository: String, message: String },

    /// The caller's cancellation signal was observed.
    #[error("Build canceled")]
    Canceled,

    /// An error occurred while parsing the `docbuilder.yaml` configuration file.
    ///
    /// Includes an optional hint about how to fix the configuration.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A document's existing front matter could not be read.
    #[error("Front matter error in {path}: {message}")]
    FrontMatter { path: String, message: String },

    /// The incremental state tracker failed to load or persist.
    #[error("State tracking error: {message}")]
    State { message: String },

    /// The rendering collaborator failed.
    #[error("Render error: {message}")]
    Render { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Default stage classification for this error.
    ///
    /// Cancellation keeps its own classification; every other error stops the
    /// build unless the stage explicitly downgrades it with
    /// [`StageError::warn`].
    pub fn classify(&self) -> StageErrorKind {
        match self {
            Error::Canceled => StageErrorKind::Canceled,
            _ => StageErrorKind::Fatal,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// How a stage failure affects the rest of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    /// Recoverable; logged and the pipeline proceeds to the next stage.
    Warn,
    /// The pipeline halts and the build is reported failed.
    Fatal,
    /// Cancellation was observed; no further stages run.
    Canceled,
}

impl fmt::Display for StageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageErrorKind::Warn => "warning",
            StageErrorKind::Fatal => "failed",
            StageErrorKind::Canceled => "canceled",
        };
        f.write_str(label)
    }
}

/// A classified stage failure.
///
/// Stages build these without knowing their own registered name; the
/// orchestrator stamps the name with [`StageError::in_stage`] before the error
/// leaves the pipeline.
#[derive(Debug)]
pub struct StageError {
    /// Name of the stage that produced the error
    pub stage: String,
    /// Classification of the failure
    pub kind: StageErrorKind,
    /// Underlying cause
    pub cause: Error,
}

impl StageError {
    /// A recoverable failure.
    pub fn warn(cause: Error) -> Self {
        Self::with_kind(StageErrorKind::Warn, cause)
    }

    /// A failure that halts the build.
    pub fn fatal(cause: Error) -> Self {
        Self::with_kind(StageErrorKind::Fatal, cause)
    }

    /// Cancellation observed.
    pub fn canceled() -> Self {
        Self::with_kind(StageErrorKind::Canceled, Error::Canceled)
    }

    fn with_kind(kind: StageErrorKind, cause: Error) -> Self {
        Self {
            stage: String::new(),
            kind,
            cause,
        }
    }

    /// Attach the originating stage's name.
    pub fn in_stage(mut self, stage: &str) -> Self {
        self.stage = stage.to_string();
        self
    }

    pub fn is_warning(&self) -> bool {
        self.kind == StageErrorKind::Warn
    }

    pub fn is_canceled(&self) -> bool {
        self.kind == StageErrorKind::Canceled
    }
}

impl From<Error> for StageError {
    fn from(cause: Error) -> Self {
        Self::with_kind(cause.classify(), cause)
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stage.is_empty() {
            write!(f, "stage {}: {}", self.kind, self.cause)
        } else {
            write!(f, "stage '{}' {}: {}", self.stage, self.kind, self.cause)
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
