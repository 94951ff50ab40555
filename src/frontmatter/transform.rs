//! Built-in front matter transformers
//!
//! A [`Transformer`] inspects one document (and the repository it came from)
//! and contributes zero or more patches. Transformers never see each other's
//! output; reconciliation is entirely the merge engine's job.

use serde_yaml::{Mapping, Value};
use url::Url;

use super::{ArrayStrategy, FrontMatterPatch, PatchMode};
use crate::config::{canonical_url, BuildConfig, RepositoryConfig};
use crate::document::DocumentRecord;

/// Priority of repository provenance fields
pub const REPOSITORY_METADATA_PRIORITY: i64 = 10;
/// Priority of repository tags
pub const REPOSITORY_TAGS_PRIORITY: i64 = 20;
/// Priority of the edit link
pub const EDIT_LINK_PRIORITY: i64 = 50;

/// Produces front matter patches for a document.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &str;

    fn patches(
        &self,
        document: &DocumentRecord,
        repository: Option<&RepositoryConfig>,
    ) -> Vec<FrontMatterPatch>;
}

/// The transformers every build runs, followed by the configured site-wide patches.
pub fn default_transformers(config: &BuildConfig) -> Vec<Box<dyn Transformer>> {
    let mut transformers: Vec<Box<dyn Transformer>> = vec![
        Box::new(RepositoryMetadata),
        Box::new(RepositoryTags),
        Box::new(EditLink),
    ];
    if !config.front_matter.is_empty() {
        transformers.push(Box::new(StaticPatches::new(config.front_matter.clone())));
    }
    transformers
}

fn single(key: &str, value: Value) -> Mapping {
    let mut data = Mapping::new();
    data.insert(Value::String(key.to_string()), value);
    data
}

/// Adds `repository` and `source_path` unless the document already declares them.
pub struct RepositoryMetadata;

impl Transformer for RepositoryMetadata {
    fn name(&self) -> &str {
        "repository-metadata"
    }

    fn patches(
        &self,
        document: &DocumentRecord,
        _repository: Option<&RepositoryConfig>,
    ) -> Vec<FrontMatterPatch> {
        let mut data = single("repository", Value::String(document.repository_name.clone()));
        data.insert(
            Value::String("source_path".to_string()),
            Value::String(document.repository_path()),
        );
        vec![FrontMatterPatch::new(
            self.name(),
            PatchMode::SetIfMissing,
            REPOSITORY_METADATA_PRIORITY,
            data,
        )]
    }
}

/// Unions the repository's configured tags into the page's `tags`.
pub struct RepositoryTags;

impl Transformer for RepositoryTags {
    fn name(&self) -> &str {
        "repository-tags"
    }

    fn patches(
        &self,
        _document: &DocumentRecord,
        repository: Option<&RepositoryConfig>,
    ) -> Vec<FrontMatterPatch> {
        let Some(repository) = repository.filter(|repo| !repo.tags.is_empty()) else {
            return Vec::new();
        };
        let tags = repository
            .tags
            .iter()
            .map(|tag| Value::String(tag.clone()))
            .collect();
        vec![FrontMatterPatch::new(
            self.name(),
            PatchMode::DeepMerge,
            REPOSITORY_TAGS_PRIORITY,
            single("tags", Value::Sequence(tags)),
        )
        .with_array_strategy(ArrayStrategy::Union)]
    }
}

/// Sets `edit_url` for repositories hosted at an http(s) URL.
pub struct EditLink;

impl EditLink {
    /// `<canonical url>/edit/<branch>/<path in repository>`
    pub fn edit_url(repository: &RepositoryConfig, document: &DocumentRecord) -> Option<String> {
        let raw = repository.url.as_deref()?;
        let parsed = Url::parse(raw).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        Some(format!(
            "{}/edit/{}/{}",
            canonical_url(raw),
            repository.branch(),
            document.repository_path()
        ))
    }
}

impl Transformer for EditLink {
    fn name(&self) -> &str {
        "edit-link"
    }

    fn patches(
        &self,
        document: &DocumentRecord,
        repository: Option<&RepositoryConfig>,
    ) -> Vec<FrontMatterPatch> {
        repository
            .and_then(|repo| Self::edit_url(repo, document))
            .map(|url| {
                FrontMatterPatch::new(
                    self.name(),
                    PatchMode::Replace,
                    EDIT_LINK_PRIORITY,
                    single("edit_url", Value::String(url)),
                )
            })
            .into_iter()
            .collect()
    }
}

/// Applies the same patches to every page (the `front-matter` config section).
pub struct StaticPatches {
    patches: Vec<FrontMatterPatch>,
}

impl StaticPatches {
    pub fn new(patches: Vec<FrontMatterPatch>) -> Self {
        Self { patches }
    }
}

impl Transformer for StaticPatches {
    fn name(&self) -> &str {
        "site-config"
    }

    fn patches(
        &self,
        _document: &DocumentRecord,
        _repository: Option<&RepositoryConfig>,
    ) -> Vec<FrontMatterPatch> {
        self.patches.clone()
    }
}
