//! The staged build pipeline.
//!
//! ## Overview
//!
//! A build runs a fixed, ordered list of stages over one [`BuildState`]:
//! 1. Prepare - Validate the configuration
//! 2. Discover - Replace the document set with a fresh generation
//! 3. Detect Changes - Compute the `DocFilesHash` and compare with the previous generation
//! 4. Track State - Record per-repository counts, hashes and paths
//! 5. Assemble Pages - Merge front matter for every document
//! 6. Render - Hand pages to the rendering collaborator when something changed
//!
//! Stages run one at a time, in declaration order. Each later stage relies on
//! the side effects of the earlier ones (the document set must exist before it
//! can be hashed, hashes before they can be tracked).
//!
//! A stage reports failures as a [`StageError`]: `Warn` is logged and the
//! pipeline continues, `Fatal` and `Canceled` halt it. Cancellation is checked
//! by the orchestrator before every stage, and by stages that loop over
//! documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::config::BuildConfig;
use crate::discovery::Discoverer;
use crate::document::DocumentSet;
use crate::error::StageError;
use crate::frontmatter::transform::Transformer;
use crate::frontmatter::Page;
use crate::hash::ChangeSignature;
use crate::render::Renderer;
use crate::state::StateTracker;

// Stage modules
pub mod assemble;
pub mod detect;
pub mod discover;
pub mod generator;
pub mod orchestrator;
pub mod prepare;
pub mod publish;
pub mod track;

/// Result type returned by every stage
pub type StageResult = std::result::Result<(), StageError>;

/// One named unit of sequential pipeline work.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run against the shared build state. Stages that iterate over many
    /// documents check `cancel` as they go.
    fn run(&self, cancel: &CancellationToken, state: &mut BuildState) -> StageResult;
}

/// The stages of a build, in execution order.
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(prepare::PrepareStage),
        Box::new(discover::DiscoverStage),
        Box::new(detect::DetectChangesStage),
        Box::new(track::TrackStateStage),
        Box::new(assemble::AssemblePagesStage),
        Box::new(publish::RenderStage),
    ]
}

/// External collaborators a build talks to
#[derive(Clone)]
pub struct Collaborators {
    pub discoverer: Arc<dyn Discoverer>,
    pub renderer: Arc<dyn Renderer>,
    /// Tracking is optional; `None` disables it without affecting output
    pub tracker: Option<Arc<dyn StateTracker>>,
    pub transformers: Arc<Vec<Box<dyn Transformer>>>,
}

/// Per-repository result of the track stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySummary {
    pub documents: usize,
    pub hash: ChangeSignature,
    pub unchanged: bool,
}

/// Mutable state shared by the stages of one build
///
/// Owned by the orchestrator for the duration of the build.
pub struct BuildState {
    pub config: BuildConfig,
    pub collaborators: Collaborators,
    /// Render even when no structural change was detected
    pub force: bool,
    /// Previous generation, kept only for comparison
    pub previous: DocumentSet,
    /// Current generation; replaced wholesale by the discover stage
    pub documents: DocumentSet,
    pub first_generation: bool,
    pub changed: bool,
    /// Generation-level change signature (`DocFilesHash`)
    pub doc_files_hash: Option<ChangeSignature>,
    pub repositories: BTreeMap<String, RepositorySummary>,
    pub pages: Vec<Page>,
    pub rendered: bool,
}

impl BuildState {
    pub fn new(config: BuildConfig, collaborators: Collaborators, previous: DocumentSet) -> Self {
        Self {
            config,
            collaborators,
            force: false,
            previous,
            documents: DocumentSet::default(),
            first_generation: false,
            changed: false,
            doc_files_hash: None,
            repositories: BTreeMap::new(),
            pages: Vec::new(),
            rendered: false,
        }
    }

    /// Whether the render stage should hand pages over.
    pub fn needs_render(&self) -> bool {
        self.force || self.first_generation || self.changed
    }
}
