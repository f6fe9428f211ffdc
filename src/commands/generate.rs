//! # Generate Command Implementation
//!
//! Aggregates the project and writes everything Vivado needs to build it:
//! `vivamir/inputs.tcl`, the driver scripts, and `veridian.yml` at the
//! project root. Existing generated files are overwritten.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use vivamir::config::FilesetKind;
use vivamir::emit::write_scripts;
use vivamir::output::{emoji, OutputConfig};
use vivamir::suggestions;

use super::LoadedProject;

/// Aggregate the libraries and write the Vivado scripts
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Only print the number of files, not every written script
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `generate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: GenerateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let spinner = spinner(&out, "Aggregating libraries...")?;
    let loaded = super::load();
    spinner.finish_and_clear();
    let project = loaded?;

    let written = generate(&project)?;
    println!(
        "{} Generated scripts for '{}' ({} design, {} simulation files)",
        emoji(&out, "✅", "[OK]"),
        project.manifest.name,
        project.aggregated.files(FilesetKind::Design).count(),
        project.aggregated.files(FilesetKind::Simulation).count(),
    );
    if !args.quiet {
        for path in written {
            println!("   {}", path.display());
        }
    }
    Ok(())
}

/// Write the scripts of a loaded project. Shared with `open`.
pub fn generate(project: &LoadedProject) -> Result<Vec<PathBuf>> {
    let inputs = project.script_inputs()?;
    write_scripts(&project.root, &inputs).map_err(suggestions::from_error)
}

/// A spinner on stderr, hidden when output is not decorated.
pub fn spinner(out: &OutputConfig, message: &'static str) -> Result<ProgressBar> {
    if !out.use_color {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}
