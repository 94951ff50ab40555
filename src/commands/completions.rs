//! # Completions Command Implementation
//!
//! `docbuilder completions <shell>` prints a completion script covering the
//! `build`, `status` and `hash` subcommands together with their flags
//! (`--config`, `--output`, `--force`, `--dry-run`, `--per-repository`) and
//! the global `--color`/`--log-level` values.
//!
//! Sites usually run docbuilder from CI, but maintainers who rebuild locally
//! can install the script once:
//!
//! ```bash
//! docbuilder completions bash > ~/.local/share/bash-completion/completions/docbuilder
//! docbuilder completions zsh > ~/.zfunc/_docbuilder
//! docbuilder completions fish > ~/.config/fish/completions/docbuilder.fish
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};
use std::io::{self, Write};

use crate::cli::Cli;

/// Shells a completion script can be generated for
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
        }
    }
}

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Write the completion script for `args.shell` to stdout.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout());
    Ok(())
}

fn write_completions(shell: CompletionShell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(Shell::from(shell), &mut cmd, name, out);
}
