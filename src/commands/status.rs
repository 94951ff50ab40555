//! # Status Command Implementation
//!
//! Prints what the state file recorded for every repository: document count
//! and document-set hash, plus the outcome of the last build when a report is
//! present in the output directory. This command never modifies any files.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use docbuilder::output::{emoji, OutputConfig};
use docbuilder::report::BuildReport;
use docbuilder::state::{FileStateTracker, StateTracker};

use super::load_config;

/// Show the tracked state of every repository
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "DOCBUILDER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config = load_config(args.config.as_deref())?;

    println!(
        "{} {} repositories configured",
        emoji(&out, "📊", "[INFO]"),
        config.repositories.len()
    );

    match &config.state_file {
        None => println!("   State tracking is disabled (no state-file configured)"),
        Some(path) => {
            let tracker = FileStateTracker::open(path)?;
            let tracked = tracker.repositories()?;
            println!("   State file: {}", path.display());

            for repo in &config.repositories {
                let id = repo.id();
                match tracked.get(&id) {
                    Some(state) => println!(
                        "   {} {}: {} documents, hash {}",
                        emoji(&out, "✅", "[OK]"),
                        repo.display_name(),
                        state.document_count,
                        state
                            .document_set_hash
                            .as_ref()
                            .map(|hash| style(hash.short()).cyan().to_string())
                            .unwrap_or_else(|| "-".to_string())
                    ),
                    None => println!(
                        "   {} {}: not built yet",
                        emoji(&out, "⏳", "[NEW]"),
                        repo.display_name()
                    ),
                }
            }

            let stale = tracked
                .keys()
                .filter(|id| config.repository(id).is_none())
                .count();
            if stale > 0 {
                println!("   {} tracked repositories are no longer configured", stale);
            }
        }
    }

    let report_path = BuildReport::path_in(&config.output);
    if report_path.exists() {
        let report = BuildReport::read(&config.output)?;
        println!(
            "\n{} Last build: {:?}, {} documents, {} warning(s)",
            emoji(&out, "📄", "[REPORT]"),
            report.status,
            report.documents,
            report.warnings.len()
        );
        if let Some(error) = &report.error {
            println!("   {}", style(error).red());
        }
    }

    Ok(())
}
