//! # Validate Command Implementation
//!
//! Loads every manifest of the project, resolves all references, aggregates
//! the libraries and prints a summary of the result. Nothing is written, but
//! `exec` references are run, since resolving them is part of the check.
//!
//! The command fails on the first aggregation error, the same way `generate`
//! would.

use anyhow::Result;
use clap::Args;

use vivamir::aggregate::{aggregate_with, discover_libraries};
use vivamir::config::{self, FilesetKind};
use vivamir::output::{emoji, OutputConfig};
use vivamir::suggestions;

/// Check the manifests and summarize the aggregated project
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also list every file of the aggregated project
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let root = super::find_root()?;
    println!(
        "{} Validating project: {}",
        emoji(&out, "🔍", "[SCAN]"),
        root.path().display()
    );

    let mut manifest = match config::load_project(&root) {
        Ok(manifest) => {
            println!(
                "{} Project manifest parsed successfully",
                emoji(&out, "✅", "[OK]")
            );
            manifest
        }
        Err(e) => return Err(fail(&out, "Project manifest is invalid", e)),
    };

    let mut libraries = match discover_libraries(&root, &manifest.workspace) {
        Ok(libraries) => {
            println!(
                "{} Found {} libraries in {}",
                emoji(&out, "✅", "[OK]"),
                libraries.len(),
                manifest.workspace.display()
            );
            libraries
        }
        Err(e) => return Err(fail(&out, "Library manifest is invalid", e)),
    };

    let project = match aggregate_with(&root, &mut manifest, &mut libraries) {
        Ok(project) => {
            println!(
                "{} All references resolved",
                emoji(&out, "✅", "[OK]")
            );
            project
        }
        Err(e) => return Err(fail(&out, "Aggregation failed", e)),
    };

    println!("\n{} Project Summary:", emoji(&out, "📊", "[INFO]"));
    println!("   Name: {}", manifest.name);
    println!(
        "   Tops: {} (design), {} (simulation)",
        manifest.design_top, manifest.simulation_top
    );
    println!(
        "   Vivado: {} on {}",
        manifest.vivado.version, manifest.vivado.part
    );
    println!(
        "   Libraries: {}",
        libraries
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    for kind in FilesetKind::ALL {
        let files = project.sorted_files(kind);
        let read_only = files
            .iter()
            .filter(|f| project.read_only.contains(*f))
            .count();
        println!(
            "   {} files: {} ({} read-only)",
            kind,
            files.len(),
            read_only
        );
        match project.destinations.get(&kind) {
            Some(dir) => println!("   {} files created in Vivado go to: {}", kind, dir),
            None => println!(
                "   {} files created in Vivado have no destination",
                kind
            ),
        }
    }
    println!("   Include directories: {}", project.includes.len());
    println!("   Trusted sub-designs: {}", project.subdesigns.len());
    println!(
        "   Ignored: {} patterns matching {} files",
        project.ignored.patterns.len(),
        project.ignored.paths.len()
    );

    if args.verbose {
        for kind in FilesetKind::ALL {
            println!("\n{} {} files:", emoji(&out, "📄", "[FILES]"), kind);
            for file in project.sorted_files(kind) {
                println!("   {}", file);
            }
        }
        println!("\n{} Include directories:", emoji(&out, "📁", "[DIRS]"));
        for dir in project.sorted_includes() {
            println!("   {}", dir);
        }
        println!("\n{} Trusted sub-designs:", emoji(&out, "🧩", "[BD]"));
        for subdesign in &project.subdesigns {
            println!("   {} ({})", subdesign.name, subdesign.source);
        }
    }

    println!("\n{} Project is valid", emoji(&out, "✅", "[OK]"));
    Ok(())
}

fn fail(out: &OutputConfig, what: &str, error: vivamir::error::Error) -> anyhow::Error {
    println!("{} {}: {}", emoji(out, "❌", "[ERR]"), what, error);
    suggestions::from_error(error)
}
