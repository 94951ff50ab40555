//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_doc("api", "index.md", "# API\n")
//!         .with_config(configs::SINGLE_REPO);
//!     fixture.command().arg("build").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// One repository checked out at `api/`, with tracking enabled.
    pub const SINGLE_REPO: &str = r#"
output: site
state-file: state/docbuilder.json
repositories:
  - name: api
    path: api
"#;

    /// Two repositories, `api/` and `guides/`, with tracking enabled.
    pub const TWO_REPOS: &str = r#"
output: site
state-file: state/docbuilder.json
repositories:
  - name: api
    url: https://github.com/acme/api.git
    path: api
    tags: [backend]
  - name: guides
    path: guides
front-matter:
  - source: site-defaults
    mode: set-if-missing
    data:
      layout: docs
"#;

    /// Valid YAML, but no repositories.
    pub const NO_REPOS: &str = "output: site\n";

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "repositories: [unclosed";

    /// Misspelled key.
    pub const UNKNOWN_KEY: &str = "statefile: state.json\n";
}

/// A temporary workspace holding repository checkouts and a `docbuilder.yaml`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `docbuilder.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("docbuilder.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a documentation file under `<repo>/docs/`.
    pub fn with_doc(self, repo: &str, path: &str, content: &str) -> Self {
        self.add_doc(repo, path, content);
        self
    }

    /// Add a documentation file to an existing fixture.
    pub fn add_doc(&self, repo: &str, path: &str, content: &str) {
        self.temp_dir
            .child(format!("{}/docs/{}", repo, path))
            .write_str(content)
            .expect("Failed to write doc file");
    }

    /// Remove a documentation file.
    #[allow(dead_code)]
    pub fn remove_doc(&self, repo: &str, path: &str) {
        std::fs::remove_file(self.path().join(format!("{}/docs/{}", repo, path)))
            .expect("Failed to remove doc file");
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A `docbuilder` command running inside the fixture, without colour.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("docbuilder");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .env_remove("DOCBUILDER_CONFIG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
