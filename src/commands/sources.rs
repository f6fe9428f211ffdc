//! # Sources Command Implementation
//!
//! Prints the aggregated project in the order the generated scripts use it.
//! Output is meant for piping, so it carries no decoration.

use anyhow::Result;
use clap::Args;

use vivamir::config::FilesetKind;

/// List the aggregated sources in project order
#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// Also list simulation files, after the design files
    #[arg(long)]
    pub simulation: bool,

    /// List include directories instead of files
    #[arg(long, conflicts_with = "simulation")]
    pub includes: bool,

    /// Print every script input as JSON
    #[arg(long, conflicts_with_all = ["simulation", "includes"])]
    pub json: bool,
}

/// Execute the `sources` command.
pub fn execute(args: SourcesArgs) -> Result<()> {
    let project = super::load()?;

    if args.json {
        let inputs = project.script_inputs()?;
        println!("{}", serde_json::to_string_pretty(&inputs)?);
        return Ok(());
    }

    let paths = if args.includes {
        project.aggregated.sorted_includes()
    } else {
        let mut paths = project.aggregated.sorted_files(FilesetKind::Design);
        if args.simulation {
            paths.extend(project.aggregated.sorted_files(FilesetKind::Simulation));
        }
        paths
    };
    for path in paths {
        println!("{}", path);
    }
    Ok(())
}
