//! Front matter patches, pages and the merge engine
//!
//! Several independent transformers contribute metadata to the same page. Each
//! contribution is a [`FrontMatterPatch`]; [`merge::apply_patches`] folds them
//! into the page's base metadata in priority order.
//!
//! Values are `serde_yaml::Value`, so the merge operates on the tagged variant
//! `Null | Bool | Number | String | Sequence | Mapping`. Mappings preserve
//! insertion order, which keeps the rendered YAML stable across runs.
//!
//! ## Submodules
//!
//! - `merge` - the priority-ordered, deep-merging patch engine
//! - `transform` - built-in transformers that produce patches for a document

pub mod merge;
pub mod transform;

use std::sync::LazyLock;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::document::DocumentRecord;
use crate::error::{Error, Result};

pub use merge::{apply_patch, apply_patches};

/// Leading `---` fenced block; compiled once for every document of a build.
static FRONT_MATTER_BLOCK: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)"));

/// How a patch's data is folded into the accumulated metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchMode {
    /// Recursively merge mappings; sequences follow the patch's array strategy.
    #[default]
    DeepMerge,
    /// Overwrite each key outright, without recursing.
    Replace,
    /// Only set keys that are currently absent.
    SetIfMissing,
}

/// How two sequences under the same key combine during a deep merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayStrategy {
    /// The incoming sequence wins.
    #[default]
    Replace,
    /// Existing elements, then incoming elements not already present.
    Union,
    /// Existing elements followed by all incoming elements.
    Append,
}

/// A named contribution to a page's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FrontMatterPatch {
    /// Provenance, used in diagnostics
    pub source: String,
    #[serde(default)]
    pub mode: PatchMode,
    /// Higher priorities apply later
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub data: Mapping,
    /// Only consulted for `DeepMerge` when both sides hold sequences
    #[serde(default)]
    pub array_strategy: ArrayStrategy,
}

impl FrontMatterPatch {
    pub fn new(source: impl Into<String>, mode: PatchMode, priority: i64, data: Mapping) -> Self {
        Self {
            source: source.into(),
            mode,
            priority,
            data,
            array_strategy: ArrayStrategy::default(),
        }
    }

    pub fn with_array_strategy(mut self, strategy: ArrayStrategy) -> Self {
        self.array_strategy = strategy;
        self
    }
}

/// One renderable unit
///
/// `merged` is cleared whenever a patch is added; merges are never
/// incremental, so the next [`Page::merge`] recomputes from the base.
#[derive(Debug, Clone)]
pub struct Page {
    pub logical_path: String,
    pub repository: String,
    base: Mapping,
    body: String,
    patches: Vec<FrontMatterPatch>,
    merged: Option<Mapping>,
}

impl Page {
    pub fn new(
        logical_path: impl Into<String>,
        repository: impl Into<String>,
        base: Mapping,
        body: impl Into<String>,
    ) -> Self {
        Self {
            logical_path: logical_path.into(),
            repository: repository.into(),
            base,
            body: body.into(),
            patches: Vec::new(),
            merged: None,
        }
    }

    pub fn base(&self) -> &Mapping {
        &self.base
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn patches(&self) -> &[FrontMatterPatch] {
        &self.patches
    }

    pub fn add_patch(&mut self, patch: FrontMatterPatch) {
        self.patches.push(patch);
        self.merged = None;
    }

    /// Merged front matter, if it has been computed since the last patch.
    pub fn merged(&self) -> Option<&Mapping> {
        self.merged.as_ref()
    }

    /// Compute (or return the cached) merged front matter.
    pub fn merge(&mut self) -> &Mapping {
        let base = &self.base;
        let patches = &self.patches;
        self.merged
            .get_or_insert_with(|| apply_patches(base, patches))
    }

    /// Front matter block followed by the body.
    pub fn render(&self) -> Result<String> {
        let merged = match &self.merged {
            Some(merged) => merged.clone(),
            None => apply_patches(&self.base, &self.patches),
        };
        render_document(&merged, &self.body)
    }
}

/// Split a leading `---` delimited YAML block from the rest of a document.
///
/// Returns `(None, content)` when the document has no front matter.
pub fn split_front_matter(content: &str) -> Result<(Option<&str>, &str)> {
    let re = FRONT_MATTER_BLOCK.as_ref().map_err(|err| err.clone())?;
    match re.captures(content) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let yaml = caps.get(1).map_or("", |m| m.as_str());
            Ok((Some(yaml), &content[whole..]))
        }
        None => Ok((None, content)),
    }
}

/// Parse a document's existing front matter into a mapping and its body.
pub fn parse_front_matter<'a>(path: &str, content: &'a str) -> Result<(Mapping, &'a str)> {
    let (yaml, body) = split_front_matter(content)?;
    let Some(yaml) = yaml else {
        return Ok((Mapping::new(), body));
    };

    let value: Value = serde_yaml::from_str(yaml).map_err(|err| Error::FrontMatter {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    match value {
        Value::Null => Ok((Mapping::new(), body)),
        Value::Mapping(map) => Ok((map, body)),
        other => Err(Error::FrontMatter {
            path: path.to_string(),
            message: format!(
                "front matter must be a mapping, found {}",
                merge::type_name(&other)
            ),
        }),
    }
}

/// Base metadata for a document: its prior front matter plus a `title` when
/// the prior metadata lacks one.
pub fn base_metadata(record: &DocumentRecord, prior: Mapping, body: &str) -> Mapping {
    let mut base = prior;
    let title_key = Value::String("title".to_string());
    if !base.contains_key(&title_key) {
        let title = first_heading(body).unwrap_or_else(|| title_from_stem(record.stem()));
        base.insert(title_key, Value::String(title));
    }
    base
}

/// Text of the first level-one Markdown heading.
pub fn first_heading(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_heading => {
                let title = text.trim().to_string();
                return (!title.is_empty()).then_some(title);
            }
            Event::Text(t) | Event::Code(t) if in_heading => text.push_str(&t),
            _ => {}
        }
    }
    None
}

/// `getting-started_guide` -> `Getting Started Guide`
pub fn title_from_stem(stem: &str) -> String {
    stem.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serialize merged front matter and prepend it to `body`.
pub fn render_document(front_matter: &Mapping, body: &str) -> Result<String> {
    let yaml = if front_matter.is_empty() {
        String::new()
    } else {
        serde_yaml::to_string(front_matter)?
    };
    Ok(format!("---\n{}---\n{}", yaml, body))
}
