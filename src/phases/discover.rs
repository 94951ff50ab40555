//! Stage 2: Discover
//!
//! Asks the discovery collaborator for the current generation and installs it
//! as the build's document set. The old set is not mutated: it stays in
//! `previous` for the change detector and the new one replaces `documents`
//! wholesale. Any discovery error is fatal.

use log::info;

use super::{BuildState, Stage, StageResult};
use crate::cancel::CancellationToken;
use crate::error::StageError;

pub struct DiscoverStage;

impl Stage for DiscoverStage {
    fn name(&self) -> &'static str {
        "discover"
    }

    fn run(&self, cancel: &CancellationToken, state: &mut BuildState) -> StageResult {
        let discoverer = state.collaborators.discoverer.clone();
        let documents = discoverer
            .discover(&state.config.repositories, cancel)
            .map_err(|err| match err {
                crate::error::Error::Canceled => StageError::canceled(),
                other => StageError::fatal(other),
            })?;

        info!(
            "Discovered {} documents in {} repositories ({} mode)",
            documents.len(),
            documents.by_repository().len(),
            if documents.is_single_repository() {
                "single-repository"
            } else {
                "multi-repository"
            }
        );
        state.documents = documents;
        Ok(())
    }
}
