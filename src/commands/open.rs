//! # Open Command Implementation
//!
//! Regenerates the scripts, then runs Vivado on `open.tcl`, which creates the
//! project when needed and opens the GUI. Vivado's log is cleaned up and
//! styled by severity while it streams.

use anyhow::Result;
use clap::Args;

use vivamir::defaults::tool_dir;
use vivamir::emit::{driver_path, OPEN_SCRIPT};
use vivamir::output::{emoji, OutputConfig};
use vivamir::suggestions;
use vivamir::vivado::{Vivado, DEFAULT_EXECUTABLE};

/// Regenerate the scripts and open the project in Vivado
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Command used to start Vivado
    #[arg(
        long,
        value_name = "COMMAND",
        env = "VIVAMIR_VIVADO",
        default_value = DEFAULT_EXECUTABLE
    )]
    pub vivado: String,

    /// Pass Vivado's output through unchanged
    #[arg(long)]
    pub raw: bool,
}

/// Execute the `open` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: OpenArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let vivado = Vivado::from_command_line(&args.vivado).map_err(suggestions::from_error)?;

    let project = super::load()?;
    super::generate::generate(&project)?;
    println!(
        "{} Opening '{}' with {}",
        emoji(&out, "🚀", "[RUN]"),
        project.manifest.name,
        vivado
    );

    // Vivado drops its logs and journals in the working directory
    let cwd = tool_dir(project.root.path());
    let script = driver_path(project.root.path(), OPEN_SCRIPT);
    let script = script.to_string_lossy();
    let status = if args.raw {
        vivado.run(&script, &cwd)
    } else {
        vivado.stream(&script, &cwd, |line| {
            println!("{}", out.render_log_line(&line));
        })
    }
    .map_err(suggestions::from_error)?;

    if !status.success() {
        return Err(anyhow::anyhow!("Vivado exited with {}", status));
    }
    println!("{} Vivado closed", emoji(&out, "✅", "[OK]"));
    Ok(())
}
