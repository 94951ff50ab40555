//! Stage 5: Assemble Pages
//!
//! Builds one [`Page`] per document: existing front matter plus a derived
//! title form the base, every transformer contributes patches, and the merge
//! engine reconciles them. The result is written back into the record's
//! `transformed_content`.
//!
//! A document whose front matter cannot be parsed is still assembled, from an
//! empty prior mapping; all such documents are reported together as one
//! warning.

use log::{debug, info};
use serde_yaml::Mapping;

use super::{BuildState, Stage, StageResult};
use crate::cancel::CancellationToken;
use crate::error::{Error, StageError};
use crate::frontmatter::{base_metadata, parse_front_matter, split_front_matter, Page};

pub struct AssemblePagesStage;

impl Stage for AssemblePagesStage {
    fn name(&self) -> &'static str {
        "assemble-pages"
    }

    fn run(&self, cancel: &CancellationToken, state: &mut BuildState) -> StageResult {
        let transformers = state.collaborators.transformers.clone();
        let mut pages = Vec::with_capacity(state.documents.len());
        let mut invalid = Vec::new();

        for index in 0..state.documents.len() {
            cancel.check()?;

            let record = &state.documents.records()[index];
            let content = String::from_utf8_lossy(&record.raw_content).into_owned();
            let (prior, body) = match parse_front_matter(&record.logical_path, &content) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!("{}", err);
                    invalid.push(record.logical_path.clone());
                    let body = split_front_matter(&content)?.1;
                    (Mapping::new(), body)
                }
            };

            let base = base_metadata(record, prior, body);
            let mut page = Page::new(
                record.logical_path.clone(),
                record.repository.clone(),
                base,
                body,
            );
            let repository = state.config.repository(&record.repository);
            for transformer in transformers.iter() {
                for patch in transformer.patches(record, repository) {
                    page.add_patch(patch);
                }
            }
            page.merge();
            let rendered = page.render()?;

            state.documents.records_mut()[index].transformed_content = rendered.into_bytes();
            pages.push(page);
        }

        info!("Assembled {} pages", pages.len());
        state.pages = pages;

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(StageError::warn(Error::FrontMatter {
                path: invalid.join(", "),
                message: format!(
                    "{} document(s) have invalid front matter and were assembled without it",
                    invalid.len()
                ),
            }))
        }
    }
}
