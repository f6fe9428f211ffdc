//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `vivamir`
//! command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `vivamir` library.
//!
//! Commands that work on an existing project share [`load`], which finds the
//! project root from the current directory and aggregates its libraries.

pub mod completions;
pub mod export;
pub mod generate;
pub mod init;
pub mod open;
pub mod root;
pub mod sources;
pub mod validate;

use anyhow::Result;

use vivamir::aggregate::{aggregate_with, discover_libraries, AggregatedProject};
use vivamir::config::{self, ProjectManifest};
use vivamir::emit::ScriptInputs;
use vivamir::path::ProjectRoot;
use vivamir::suggestions;

/// A project loaded from the current directory.
pub struct LoadedProject {
    pub root: ProjectRoot,
    pub manifest: ProjectManifest,
    pub aggregated: AggregatedProject,
}

impl LoadedProject {
    pub fn script_inputs(&self) -> Result<ScriptInputs> {
        ScriptInputs::new(&self.root, &self.manifest, &self.aggregated)
            .map_err(suggestions::from_error)
    }
}

/// Find the project root above the current directory.
pub fn find_root() -> Result<ProjectRoot> {
    let cwd = std::env::current_dir()?;
    ProjectRoot::discover(&cwd).map_err(suggestions::from_error)
}

/// Find the project root, load its manifests and aggregate them.
pub fn load() -> Result<LoadedProject> {
    let root = find_root()?;
    let mut manifest = config::load_project(&root).map_err(suggestions::from_error)?;
    let mut libraries =
        discover_libraries(&root, &manifest.workspace).map_err(suggestions::from_error)?;
    let aggregated = aggregate_with(&root, &mut manifest, &mut libraries)
        .map_err(suggestions::from_error)?;
    Ok(LoadedProject {
        root,
        manifest,
        aggregated,
    })
}
