//! # Build Configuration
//!
//! This module defines the data structures that represent a `docbuilder.yaml`
//! file and the logic for parsing it.
//!
//! ## Key Components
//!
//! - **`BuildConfig`**: The whole file: output root, optional state file,
//!   include/exclude patterns, repositories and site-wide front matter patches.
//!
//! - **`RepositoryConfig`**: One documentation source. A repository is
//!   identified by its canonical URL when it has one, otherwise by its
//!   checkout path.
//!
//! ## Example
//!
//! ```yaml
//! output: site
//! state-file: .docbuilder/state.json
//! repositories:
//!   - url: https://github.com/acme/api.git
//!     path: checkouts/api
//!     docs: [docs]
//!     tags: [backend]
//! front-matter:
//!   - source: site-defaults
//!     mode: set-if-missing
//!     data: { type: docs }
//! ```
//!
//! Relative paths are resolved against the directory containing the
//! configuration file when it is loaded with [`from_file`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frontmatter::FrontMatterPatch;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "docbuilder.yaml";

/// File name of the persisted build report inside the output root
pub const REPORT_FILE: &str = "build-report.json";

fn default_output() -> PathBuf {
    PathBuf::from("site")
}

fn default_include() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.markdown".to_string()]
}

fn default_docs() -> Vec<String> {
    vec!["docs".to_string()]
}

/// Top-level `docbuilder.yaml` contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildConfig {
    /// Output root for generated content and the build report
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Where incremental state is persisted; tracking is disabled when absent
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Glob patterns (relative to a docs directory) selecting documentation files
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// Glob patterns removed after `include` is applied
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
    /// Patches applied to every page
    #[serde(default)]
    pub front_matter: Vec<FrontMatterPatch>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            state_file: None,
            include: default_include(),
            exclude: Vec::new(),
            repositories: Vec::new(),
            front_matter: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Resolve relative paths against `root`.
    pub fn resolve_paths(&mut self, root: &Path) {
        self.output = resolve(root, &self.output);
        self.state_file = self.state_file.as_deref().map(|path| resolve(root, path));
        for repo in &mut self.repositories {
            repo.path = resolve(root, &repo.path);
        }
    }

    /// Look up a repository by identity.
    pub fn repository(&self, id: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|repo| repo.id() == id)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// One documentation source repository
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Display name; derived from the URL or path when omitted
    #[serde(default)]
    pub name: Option<String>,
    /// Remote URL, used as the repository identity and for edit links
    #[serde(default)]
    pub url: Option<String>,
    /// Branch used for edit links (defaults to `main`)
    #[serde(default)]
    pub branch: Option<String>,
    /// Local checkout
    pub path: PathBuf,
    /// Directories inside the checkout that hold documentation
    #[serde(default = "default_docs")]
    pub docs: Vec<String>,
    /// Tags contributed to every page from this repository
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RepositoryConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            url: None,
            branch: None,
            path: path.into(),
            docs: default_docs(),
            tags: Vec::new(),
        }
    }

    /// Stable identity: canonical URL, else the checkout path.
    pub fn id(&self) -> String {
        match &self.url {
            Some(url) => canonical_url(url),
            None => self.path.to_string_lossy().into_owned(),
        }
    }

    /// Name used to prefix logical paths in multi-repository builds.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if let Some(url) = &self.url {
            let canonical = canonical_url(url);
            if let Some(last) = canonical.rsplit(|c: char| c == '/' || c == ':').next() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or("main")
    }
}

/// Strip whitespace, trailing slashes and a `.git` suffix from a URL.
pub fn canonical_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix(".git")
        .unwrap_or(trimmed)
        .to_string()
}

/// Parse a YAML string into a `BuildConfig`.
pub fn parse(yaml_content: &str) -> Result<BuildConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(BuildConfig::default());
    }
    serde_yaml::from_str::<BuildConfig>(yaml_content).map_err(|err| {
        let message = err.to_string();
        let hint = hint_for(&message);
        Error::ConfigParse { message, hint }
    })
}

fn hint_for(message: &str) -> Option<String> {
    if message.contains("missing field `path`") {
        Some("every repository needs a local checkout: add 'path:' to the entry".to_string())
    } else if message.contains("unknown variant") && message.contains("mode") {
        Some("front matter modes are deep-merge, replace and set-if-missing".to_string())
    } else if message.contains("unknown field") {
        Some("check the key spelling; keys use kebab-case (e.g. state-file)".to_string())
    } else {
        None
    }
}

/// Load a configuration file, resolving relative paths against its directory.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<BuildConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let mut config = parse(&content)?;
    let root = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config.resolve_paths(root);
    Ok(config)
}
