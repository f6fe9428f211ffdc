//! # Export Command Implementation
//!
//! Brings work done inside Vivado back into the versioned tree:
//!
//! 1. Vivado runs `export.tcl`, which writes every block design of the
//!    project as a Tcl script (skipped with `--skip-tool`).
//! 2. The export reconciler copies imported files Vivado may have edited back
//!    onto their originals, and files created in Vivado into the destination
//!    fileset of their kind.
//! 3. The stale design warning Vivado embeds in exported block designs is
//!    stripped.
//!
//! Copying is best-effort: every failure is listed at the end and makes the
//! command exit with an error, but does not stop the other files.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

use vivamir::defaults::{tool_dir, SUBDESIGN_SUFFIX};
use vivamir::emit::{driver_path, EXPORT_SCRIPT};
use vivamir::output::{emoji, OutputConfig};
use vivamir::path::absolute_in;
use vivamir::reconcile::{clean_block_design, reconcile, ReconcileReport, ToolLayout};
use vivamir::suggestions;
use vivamir::vivado::{Vivado, DEFAULT_EXECUTABLE};

use super::LoadedProject;

/// Export the Vivado project back into the versioned tree
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Do not ask for confirmation before overwriting sources
    #[arg(short, long)]
    pub yes: bool,

    /// Do not run Vivado, only copy files from an earlier export
    #[arg(long)]
    pub skip_tool: bool,

    /// Command used to start Vivado
    #[arg(
        long,
        value_name = "COMMAND",
        env = "VIVAMIR_VIVADO",
        default_value = DEFAULT_EXECUTABLE
    )]
    pub vivado: String,
}

/// Execute the `export` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ExportArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let project = super::load()?;

    if !args.yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Export '{}' and overwrite its sources with Vivado's copies?",
                project.manifest.name
            ))
            .default(false)
            .interact()?;
        if !proceed {
            println!("Export cancelled.");
            return Ok(());
        }
    }

    if !args.skip_tool {
        run_export_script(&project, &args.vivado, &out)?;
    }

    println!(
        "\n{} Copying files back into the source tree...",
        emoji(&out, "🔄", "[SYNC]")
    );
    let layout = ToolLayout::new(&project.root, &project.manifest.name);
    let report = reconcile(&project.root, &layout, &project.aggregated);
    print_report(&out, &report);

    let cleaned = clean_block_designs(&project)?;
    if cleaned > 0 {
        println!(
            "{} Removed the stale design warning from {} block design(s)",
            emoji(&out, "🧹", "[CLEAN]"),
            cleaned
        );
    }

    if report.has_errors() {
        return Err(suggestions::export_incomplete(report.error_count()));
    }
    println!(
        "{} Export complete, {} file(s) copied",
        emoji(&out, "✅", "[OK]"),
        report.copied_count()
    );
    Ok(())
}

fn run_export_script(project: &LoadedProject, command: &str, out: &OutputConfig) -> Result<()> {
    let vivado = Vivado::from_command_line(command).map_err(suggestions::from_error)?;
    super::generate::generate(project)?;
    println!(
        "{} Exporting block designs with {}",
        emoji(out, "🚀", "[RUN]"),
        vivado
    );

    let cwd = tool_dir(project.root.path());
    let script = driver_path(project.root.path(), EXPORT_SCRIPT);
    let status = vivado
        .stream(&script.to_string_lossy(), &cwd, |line| {
            println!("{}", out.render_log_line(&line));
        })
        .map_err(suggestions::from_error)?;
    if !status.success() {
        return Err(anyhow::anyhow!(
            "Vivado exited with {} while exporting, no files were copied back",
            status
        ));
    }
    Ok(())
}

fn print_report(out: &OutputConfig, report: &ReconcileReport) {
    for (kind, result) in &report.kinds {
        match &result.mapping {
            Some(mapping) => {
                println!(
                    "   {}: {} restored, {} created, {} read-only skipped (common root {})",
                    kind,
                    result.restored.len(),
                    result.created.len(),
                    result.skipped.len(),
                    mapping.common_root
                );
                for path in &result.created {
                    println!("      + {}", path);
                }
            }
            None if result.errors.is_empty() => println!("   {}: nothing to export", kind),
            None => println!("   {}: skipped", kind),
        }
        for error in &result.errors {
            println!("   {} {}", emoji(out, "❌", "[ERR]"), error);
        }
    }
}

/// Strip the stale design warning from every trusted sub-design and from the
/// scripts written for new block designs.
fn clean_block_designs(project: &LoadedProject) -> Result<usize> {
    let mut scripts: Vec<PathBuf> = project
        .aggregated
        .subdesigns
        .iter()
        .map(|s| absolute_in(&s.source, &project.root))
        .collect();

    if let Some(dir) = &project.manifest.block_designs.new_design_path {
        let dir = project.root.path().join(dir);
        if dir.is_dir() {
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                let is_script = path
                    .extension()
                    .is_some_and(|ext| ext == SUBDESIGN_SUFFIX);
                if is_script && !scripts.contains(&path) {
                    scripts.push(path);
                }
            }
        }
    }

    let mut cleaned = 0;
    for script in scripts.iter().filter(|s| s.is_file()) {
        if clean_block_design(script).map_err(suggestions::from_error)? {
            cleaned += 1;
        }
    }
    Ok(cleaned)
}
