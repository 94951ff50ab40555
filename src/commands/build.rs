//! Build command implementation
//!
//! The build command runs one generation of the pipeline:
//! 1. Validate the configuration
//! 2. Discover documents in every repository checkout
//! 3. Compare the document set with the previous generation
//! 4. Record per-repository state
//! 5. Assemble pages with merged front matter
//! 6. Write the pages when something changed (or `--force`)
//!
//! Ctrl-C cancels the build at the next check point; nothing is written to the
//! state file after that and the command exits with code 130.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use console::style;
use log::warn;

use docbuilder::cancel::CancellationToken;
use docbuilder::output::{emoji, OutputConfig};
use docbuilder::phases::generator::{BuildOptions, Generator};
use docbuilder::report::BuildReport;

use super::{load_config, EXIT_CANCELED};

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "DOCBUILDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output directory (overrides `output` in the config file)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Render even when no structural change was detected
    #[arg(short, long)]
    pub force: bool,

    /// Run every stage without writing pages, state or the report
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the build command
pub fn execute(args: BuildArgs, color_flag: &str) -> Result<ExitCode> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(output) = args.output {
        config.output = output;
    }
    let output_dir = config.output.clone();

    if !args.quiet {
        println!("{} docbuilder build", emoji(&out, "📚", "[BUILD]"));
        if args.dry_run {
            println!(
                "{} DRY RUN MODE - No files will be written",
                emoji(&out, "🔎", "[DRY]")
            );
        }
        println!();
    }

    let options = BuildOptions {
        force: args.force,
        dry_run: args.dry_run,
        write_report: true,
    };
    let mut generator = Generator::from_config(config, options)?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Failed to set Ctrl+C handler: {}", err);
    }

    match generator.build(&cancel) {
        Ok(report) => {
            if !args.quiet {
                print_summary(&out, &report, &output_dir, args.dry_run);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_canceled() => {
            if !args.quiet {
                println!("{} Build canceled", emoji(&out, "⏹️", "[CANCELED]"));
            }
            Ok(ExitCode::from(EXIT_CANCELED))
        }
        Err(err) => {
            if !args.quiet {
                println!("{} Build failed", emoji(&out, "❌", "[ERR]"));
                println!();
            }
            Err(err.into())
        }
    }
}

fn print_summary(out: &OutputConfig, report: &BuildReport, output_dir: &std::path::Path, dry_run: bool) {
    println!(
        "{} Built {} documents in {:.2}s",
        emoji(out, "✅", "[OK]"),
        report.documents,
        report.duration_ms as f64 / 1000.0
    );

    if let Some(hash) = &report.doc_files_hash {
        println!("   Document set: {}", style(hash.short()).cyan());
    }

    let state = if report.first_generation {
        "first generation"
    } else if report.changed {
        "changed"
    } else {
        "unchanged"
    };
    println!("   Generation: {}", state);

    for repo in &report.repositories {
        let marker = if repo.unchanged {
            style("unchanged").dim()
        } else {
            style("updated").green()
        };
        println!("   {} ({} documents, {})", repo.id, repo.documents, marker);
    }

    for warning in &report.warnings {
        println!("{} {}", emoji(out, "⚠️", "[WARN]"), style(warning).yellow());
    }

    if report.rendered && !dry_run {
        println!("   Pages written to: {}", output_dir.join("content").display());
    } else if !report.rendered {
        println!("   No changes to render (use --force to rebuild)");
    }
}
