//! Stage 3: Detect Changes
//!
//! Computes the generation's `DocFilesHash` and compares the new document set
//! with the previous generation. Only the logical path sets are compared, so
//! an edit that keeps every path in place is not a change here.

use log::info;

use super::{BuildState, Stage, StageResult};
use crate::cancel::CancellationToken;
use crate::change::detect_changes;

pub struct DetectChangesStage;

impl Stage for DetectChangesStage {
    fn name(&self) -> &'static str {
        "detect-changes"
    }

    fn run(&self, _cancel: &CancellationToken, state: &mut BuildState) -> StageResult {
        let signature = state.documents.signature();
        state.first_generation = state.previous.is_empty();
        state.changed = detect_changes(&state.previous, &state.documents);

        if state.first_generation {
            info!("First generation: {} documents ({})", state.documents.len(), signature.short());
        } else if state.changed {
            info!(
                "Document set changed: {} -> {} documents ({})",
                state.previous.len(),
                state.documents.len(),
                signature.short()
            );
        } else {
            info!(
                "No structural change in {} documents ({}); content-only edits need --force",
                state.documents.len(),
                signature.short()
            );
        }

        state.doc_files_hash = Some(signature);
        Ok(())
    }
}
