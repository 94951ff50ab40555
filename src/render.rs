//! Hand-off to the rendering collaborator
//!
//! The pipeline never runs a site renderer itself. It passes the merged pages
//! and the generation's [`ChangeSignature`] to a [`Renderer`]. The default
//! [`ContentWriter`] stages each page under `<output>/content/<logical path>`,
//! which is where an external static site generator picks them up.
//!
//! The content directory belongs to the writer: after a render it holds
//! exactly the pages of that generation.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::frontmatter::Page;
use crate::hash::ChangeSignature;

/// Consumes the final page set of a generation.
pub trait Renderer: Send + Sync {
    fn render(&self, pages: &[Page], signature: &ChangeSignature) -> Result<()>;
}

/// Writes assembled pages into the output content directory
#[derive(Debug, Clone)]
pub struct ContentWriter {
    content_root: PathBuf,
}

impl ContentWriter {
    pub fn new(output_root: &Path) -> Self {
        Self {
            content_root: output_root.join("content"),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Delete files under the content root that are not one of `pages`, then
    /// any directories left empty. Returns the number of files removed.
    fn remove_stale(&self, pages: &[Page]) -> Result<usize> {
        if !self.content_root.is_dir() {
            return Ok(0);
        }
        let keep: BTreeSet<PathBuf> = pages
            .iter()
            .map(|page| self.content_root.join(&page.logical_path))
            .collect();

        let mut removed = 0;
        for entry in WalkDir::new(&self.content_root).min_depth(1).contents_first(true) {
            let entry = entry.map_err(|e| Error::Render {
                message: format!("Failed to scan '{}': {}", self.content_root.display(), e),
            })?;
            let path = entry.path();
            if entry.file_type().is_dir() {
                if is_empty_dir(path)? {
                    fs::remove_dir(path).map_err(|e| Error::Render {
                        message: format!("Failed to remove directory '{}': {}", path.display(), e),
                    })?;
                }
            } else if !keep.contains(path) {
                debug!("Removing stale page {}", path.display());
                fs::remove_file(path).map_err(|e| Error::Render {
                    message: format!("Failed to remove file '{}': {}", path.display(), e),
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::Render {
        message: format!("Failed to read directory '{}': {}", path.display(), e),
    })?;
    Ok(entries.next().is_none())
}

impl Renderer for ContentWriter {
    fn render(&self, pages: &[Page], signature: &ChangeSignature) -> Result<()> {
        for page in pages {
            let full_path = self.content_root.join(&page.logical_path);

            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::Render {
                    message: format!("Failed to create directory '{}': {}", parent.display(), e),
                })?;
            }

            let content = page.render()?;
            fs::write(&full_path, content).map_err(|e| Error::Render {
                message: format!("Failed to write file '{}': {}", full_path.display(), e),
            })?;
        }

        let removed = self.remove_stale(pages)?;
        info!(
            "Wrote {} pages to {}, removed {} stale (signature {})",
            pages.len(),
            self.content_root.display(),
            removed,
            signature.short()
        );
        Ok(())
    }
}

/// Renderer that discards its input, for dry runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&self, pages: &[Page], signature: &ChangeSignature) -> Result<()> {
        info!(
            "Dry run: {} pages not written (signature {})",
            pages.len(),
            signature.short()
        );
        Ok(())
    }
}
