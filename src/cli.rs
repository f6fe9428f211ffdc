//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Vivamir - Assemble Vivado projects from versioned library manifests
#[derive(Parser, Debug)]
#[command(name = "vivamir")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new project with a first library
    Init(commands::init::InitArgs),

    /// Aggregate the libraries and write the Vivado scripts
    Generate(commands::generate::GenerateArgs),

    /// List the aggregated sources in project order
    Sources(commands::sources::SourcesArgs),

    /// Check the manifests and summarize the aggregated project
    Validate(commands::validate::ValidateArgs),

    /// Regenerate the scripts and open the project in Vivado
    Open(commands::open::OpenArgs),

    /// Export the Vivado project back into the versioned tree
    Export(commands::export::ExportArgs),

    /// Print the project root directory
    Root(commands::root::RootArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &self.color),
            Commands::Generate(args) => commands::generate::execute(args, &self.color),
            Commands::Sources(args) => commands::sources::execute(args),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
            Commands::Open(args) => commands::open::execute(args, &self.color),
            Commands::Export(args) => commands::export::execute(args, &self.color),
            Commands::Root(args) => commands::root::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Route `log` records to stderr. `RUST_LOG` takes precedence over the flag.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second initialization only happens in tests and is harmless
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
