//! # Hash Command Implementation
//!
//! Runs discovery over the configured checkouts and prints the resulting
//! `DocFilesHash`, the signature over every logical path. Nothing is written,
//! which makes it usable from scripts that want to know whether a rebuild is
//! due.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use docbuilder::cancel::CancellationToken;
use docbuilder::discovery::{Discoverer, FsDiscoverer};

use super::load_config;

/// Print the document-set hash of the current checkouts
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "DOCBUILDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also print a hash per repository, as recorded in the state file
    #[arg(short = 'r', long)]
    pub per_repository: bool,
}

/// Execute the `hash` command.
pub fn execute(args: HashArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let discoverer = FsDiscoverer::from_config(&config)?;
    let documents = discoverer.discover(&config.repositories, &CancellationToken::new())?;

    println!("{}", documents.signature());

    if args.per_repository {
        for (repository, records) in documents.by_repository() {
            // Same per-repository hash the state file records.
            let signature =
                docbuilder::hash::compute_signature(records.iter().map(|r| r.repository_path()));
            println!("{}  {} ({} documents)", signature, repository, records.len());
        }
    }
    Ok(())
}
