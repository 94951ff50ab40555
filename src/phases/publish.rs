//! Stage 6: Render
//!
//! Hands the assembled pages and the generation's signature to the rendering
//! collaborator, but only when the generation needs it: the first generation,
//! a structural change, or a forced build.

use log::info;

use super::{BuildState, Stage, StageResult};
use crate::cancel::CancellationToken;
use crate::error::StageError;

pub struct RenderStage;

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn run(&self, _cancel: &CancellationToken, state: &mut BuildState) -> StageResult {
        if !state.needs_render() {
            info!("No changes detected; skipping render");
            state.rendered = false;
            return Ok(());
        }

        let signature = state
            .doc_files_hash
            .clone()
            .unwrap_or_else(|| state.documents.signature());
        let renderer = state.collaborators.renderer.clone();
        renderer
            .render(&state.pages, &signature)
            .map_err(StageError::fatal)?;
        state.rendered = true;
        Ok(())
    }
}
