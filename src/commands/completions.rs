//! `vivamir completions <shell>`: print a completion script for the vivamir
//! command line, covering every subcommand and flag including `--vivado`.
//!
//! ```bash
//! vivamir completions bash > ~/.local/share/bash-completion/completions/vivamir
//! vivamir completions zsh > ~/.zfunc/_vivamir
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Name the scripts complete, which must match the installed binary.
const BIN_NAME: &str = "vivamir";

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate the script for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout().lock())
}

fn write_completions<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut out = Vec::new();
        write_completions(shell, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bash_script_lists_project_commands() {
        let bash = script(Shell::Bash);
        for command in ["init", "generate", "sources", "validate", "open", "export", "root"] {
            assert!(bash.contains(command), "missing {command}");
        }
        assert!(bash.contains("--vivado"));
    }

    #[test]
    fn test_fish_script_completes_export_flags() {
        let fish = script(Shell::Fish);
        assert!(fish.contains("skip-tool"));
        assert!(fish.contains("yes"));
    }
}
