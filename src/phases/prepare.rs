//! Stage 1: Prepare
//!
//! Validates the build configuration before any I/O happens. A build with no
//! repositories cannot produce a site and fails here. Problems that still
//! allow a build (duplicate repository identities, an empty include list)
//! are reported as warnings.

use std::collections::BTreeMap;

use log::info;

use super::{BuildState, Stage, StageResult};
use crate::cancel::CancellationToken;
use crate::error::{Error, StageError};

pub struct PrepareStage;

impl Stage for PrepareStage {
    fn name(&self) -> &'static str {
        "prepare"
    }

    fn run(&self, _cancel: &CancellationToken, state: &mut BuildState) -> StageResult {
        let config = &state.config;
        if config.repositories.is_empty() {
            return Err(StageError::fatal(Error::Validation {
                message: "no repositories configured".to_string(),
            }));
        }

        let mut problems = Vec::new();

        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        for repo in &config.repositories {
            *seen.entry(repo.id()).or_default() += 1;
        }
        for (id, count) in seen.iter().filter(|(_, count)| **count > 1) {
            problems.push(format!("repository '{}' is configured {} times", id, count));
        }

        if config.include.is_empty() {
            problems.push("no include patterns; discovery will find nothing".to_string());
        }

        info!(
            "Building {} repositories into {}",
            config.repositories.len(),
            config.output.display()
        );

        if problems.is_empty() {
            Ok(())
        } else {
            Err(StageError::warn(Error::Validation {
                message: problems.join("; "),
            }))
        }
    }
}
