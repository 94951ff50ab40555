//! Multi-generation build driver
//!
//! A [`Generator`] owns the previous generation's document set between
//! successive [`Generator::build`] calls. Each build hands that set to a fresh
//! [`BuildState`], runs the stage pipeline, and on success keeps the new
//! generation as the baseline for the next one. A failed or canceled build
//! leaves the baseline untouched, so the next build compares against the last
//! generation that actually completed.
//!
//! Every build produces a [`BuildReport`], whatever its outcome.

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use super::orchestrator::{run_stages, PipelineRun};
use super::{default_stages, BuildState, Collaborators, Stage};
use crate::cancel::CancellationToken;
use crate::config::BuildConfig;
use crate::discovery::FsDiscoverer;
use crate::document::DocumentSet;
use crate::error::{Result, StageError};
use crate::frontmatter::transform::default_transformers;
use crate::render::{ContentWriter, NoopRenderer, Renderer};
use crate::report::{BuildReport, BuildStatus, RepositoryReport};
use crate::state::{previous_generation, FileStateTracker, StateTracker};

/// Per-build switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Render even when no structural change was detected
    pub force: bool,
    /// Skip page writes, state writes and the report
    pub dry_run: bool,
    /// Write `build-report.json` into the output root
    pub write_report: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            force: false,
            dry_run: false,
            write_report: true,
        }
    }
}

pub struct Generator {
    config: BuildConfig,
    collaborators: Collaborators,
    stages: Vec<Box<dyn Stage>>,
    previous: DocumentSet,
    options: BuildOptions,
    last_report: Option<BuildReport>,
}

impl Generator {
    /// A generator with no previous generation; the first build is a full one.
    pub fn new(config: BuildConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            stages: default_stages(),
            previous: DocumentSet::default(),
            options: BuildOptions::default(),
            last_report: None,
        }
    }

    /// Wire the filesystem collaborators described by `config`.
    ///
    /// When a state file is configured, the previous generation is seeded
    /// from the paths it recorded. Dry runs read that state but never write it.
    pub fn from_config(config: BuildConfig, options: BuildOptions) -> Result<Self> {
        let discoverer = Arc::new(FsDiscoverer::from_config(&config)?);
        let renderer: Arc<dyn Renderer> = if options.dry_run {
            Arc::new(NoopRenderer)
        } else {
            Arc::new(ContentWriter::new(&config.output))
        };

        let (tracker, previous) = match &config.state_file {
            Some(path) => {
                let tracker = FileStateTracker::open(path)?;
                let previous = previous_generation(&tracker)?;
                info!(
                    "Loaded state for {} documents from {}",
                    previous.len(),
                    path.display()
                );
                let tracker: Arc<dyn StateTracker> = Arc::new(tracker);
                (Some(tracker), previous)
            }
            None => (None, DocumentSet::default()),
        };

        let collaborators = Collaborators {
            discoverer,
            renderer,
            tracker: if options.dry_run { None } else { tracker },
            transformers: Arc::new(default_transformers(&config)),
        };

        Ok(Self::new(config, collaborators)
            .with_previous(previous)
            .with_options(options))
    }

    pub fn with_previous(mut self, previous: DocumentSet) -> Self {
        self.previous = previous;
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the stage list; mostly useful for tests.
    pub fn with_stages(mut self, stages: Vec<Box<dyn Stage>>) -> Self {
        self.stages = stages;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The baseline the next build compares against.
    pub fn previous(&self) -> &DocumentSet {
        &self.previous
    }

    pub fn last_report(&self) -> Option<&BuildReport> {
        self.last_report.as_ref()
    }

    /// Run one generation.
    ///
    /// Returns the report on success (warnings included) and the halting
    /// error otherwise. The report is available from
    /// [`Generator::last_report`] in both cases.
    pub fn build(&mut self, cancel: &CancellationToken) -> std::result::Result<BuildReport, StageError> {
        let started = Instant::now();
        let previous = std::mem::take(&mut self.previous);
        let mut state = BuildState::new(self.config.clone(), self.collaborators.clone(), previous);
        state.force = self.options.force;

        let run = run_stages(&self.stages, cancel, &mut state);
        let mut report = build_report(&state, &run, started);

        if self.options.write_report && !self.options.dry_run {
            match report.write(&self.config.output) {
                Ok(path) => info!("Wrote build report to {}", path.display()),
                Err(err) => {
                    warn!("Failed to write build report: {}", err);
                    report.warnings.push(format!("report: {}", err));
                }
            }
        }

        let BuildState {
            previous,
            documents,
            ..
        } = state;
        self.previous = if run.is_success() { documents } else { previous };
        self.last_report = Some(report.clone());

        match run.terminal {
            None => {
                info!(
                    "Build finished in {} ms: {} documents, {} warning(s), rendered: {}",
                    report.duration_ms,
                    report.documents,
                    report.warnings.len(),
                    report.rendered
                );
                Ok(report)
            }
            Some(err) => Err(err),
        }
    }
}

fn build_report(state: &BuildState, run: &PipelineRun, started: Instant) -> BuildReport {
    BuildReport {
        status: BuildStatus::from(run.terminal.as_ref()),
        error: run.terminal.as_ref().map(|err| err.to_string()),
        doc_files_hash: state.doc_files_hash.clone(),
        documents: state.documents.len(),
        first_generation: state.first_generation,
        changed: state.changed,
        rendered: state.rendered,
        repositories: state
            .repositories
            .iter()
            .map(|(id, summary)| RepositoryReport {
                id: id.clone(),
                documents: summary.documents,
                hash: summary.hash.clone(),
                unchanged: summary.unchanged,
            })
            .collect(),
        stages: run.records.clone(),
        warnings: run.warnings.iter().map(|err| err.to_string()).collect(),
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}
