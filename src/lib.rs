//! # docbuilder
//!
//! Aggregates documentation from many source repositories into one static
//! site and regenerates it incrementally as the repositories change. The
//! `docbuilder` command-line tool is a thin layer over this library.
//!
//! ## Quick Example
//!
//! ```
//! use docbuilder::document::{DocumentRecord, DocumentSet};
//! use docbuilder::change::detect_changes;
//!
//! let before = DocumentSet::new(vec![
//!     DocumentRecord::new("api", "api", "intro.md", Vec::new()),
//! ]);
//! let after = DocumentSet::new(vec![
//!     DocumentRecord::new("api", "api", "intro.md", Vec::new()),
//!     DocumentRecord::new("api", "api", "usage.md", Vec::new()),
//! ]);
//!
//! assert!(detect_changes(&before, &after));
//! assert_ne!(before.signature(), after.signature());
//! ```
//!
//! ## Core Concepts
//!
//! - **Content hashing (`hash`)**: a [`hash::ChangeSignature`] fingerprints
//!   the set of logical paths in a generation, independent of discovery order.
//! - **Change detection (`change`)**: decides whether a new generation differs
//!   structurally from the previous one, which gates rendering.
//! - **Front matter (`frontmatter`)**: transformers contribute prioritized
//!   patches per page and the merge engine reconciles them deterministically.
//! - **Incremental state (`state`)**: per-repository counts, hashes and paths
//!   persisted for future runs.
//! - **Phases (`phases`)**: the staged pipeline with typed failure
//!   classification and cooperative cancellation.
//!
//! ## Execution Flow
//!
//! [`phases::generator::Generator`] runs the stages in order for every build:
//!
//! 1.  **Prepare**: validate the configuration.
//! 2.  **Discover**: collect the current generation from every repository.
//! 3.  **Detect Changes**: hash the generation and compare with the previous one.
//! 4.  **Track State**: record per-repository summaries.
//! 5.  **Assemble Pages**: merge front matter for every document.
//! 6.  **Render**: hand the pages to the renderer when something changed.
//!
//! A `build-report.json` summarizing the outcome is written after every build.

pub mod cancel;
pub mod change;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod hash;
pub mod output;
pub mod phases;
pub mod render;
pub mod report;
pub mod state;

#[cfg(test)]
mod change_proptest;
