//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `docbuilder` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `docbuilder` library.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use docbuilder::config::{self, BuildConfig, DEFAULT_CONFIG_FILE};

pub mod build;
pub mod completions;
pub mod hash;
pub mod status;

/// Exit code reported when a build is canceled (128 + SIGINT)
pub const EXIT_CANCELED: u8 = 130;

/// Load the build configuration from `path`, or `docbuilder.yaml` in the
/// current directory.
pub fn load_config(path: Option<&Path>) -> Result<BuildConfig> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if !config_path.exists() {
        anyhow::bail!("Configuration file not found: {}", config_path.display());
    }

    config::from_file(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))
}
