//! # Vivamir Library
//!
//! This library assembles Vivado projects out of several libraries, each
//! described by its own manifest. It is used by the `vivamir` command-line
//! tool but can be driven directly by other build tooling.
//!
//! ## Quick Example
//!
//! ```no_run
//! use vivamir::aggregate::aggregate;
//! use vivamir::config::{self, FilesetKind};
//! use vivamir::emit::{write_scripts, ScriptInputs};
//! use vivamir::path::ProjectRoot;
//!
//! # fn main() -> vivamir::error::Result<()> {
//! // Walk up from the current directory to the folder holding vivamir.toml
//! let root = ProjectRoot::discover(std::env::current_dir()?)?;
//!
//! // Merge the project manifest with every library of the workspace
//! let project = aggregate(&root)?;
//! for file in project.sorted_files(FilesetKind::Design) {
//!     println!("{}", file);
//! }
//!
//! // Write the Tcl inputs and drivers for Vivado
//! let manifest = config::load_project(&root)?;
//! let inputs = ScriptInputs::new(&root, &manifest, &project)?;
//! write_scripts(&root, &inputs)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! - **Project paths (`path`)**: every file is tracked as a [`path::ProjectPath`],
//!   relative to the project root, ordered depth first then by name.
//! - **Manifests (`config`)**: `vivamir.toml` at the root and one
//!   `vivamir.lib.toml` per library in the workspace directory.
//! - **References (`resolve`)**: declared paths are either literal or produced
//!   by a shell command. Each one is resolved at most once.
//! - **Aggregation (`aggregate`, `ignore`)**: all filesets, includes and trusted
//!   sub-designs are merged into de-duplicated sets, minus ignored files.
//! - **Emission (`emit`)**: the merged project is written as a Tcl preamble
//!   read by fixed driver scripts.
//! - **Reconciliation (`reconcile`)**: after an export, files Vivado edited or
//!   created are copied back into the versioned tree.
//!
//! ## Execution Flow
//!
//! 1.  **Discovery**: find the project root and the libraries of its workspace.
//! 2.  **Resolution**: resolve every reference of every manifest.
//! 3.  **Aggregation**: merge files per fileset kind and subtract ignores.
//! 4.  **Emission**: write `inputs.tcl`, the drivers and `veridian.yml`.
//! 5.  **Tool run**: Vivado builds, opens or exports the project (`vivado`).
//! 6.  **Reconciliation**: copy exported files back (`export` only).
//!
//! ## Limitations
//!
//! Every operation is synchronous and assumes it is the only one touching the
//! project root. Concurrent runs against the same root are not supported and
//! may race on the generated scripts and the copied-back files. No lock is
//! taken to prevent this.

pub mod aggregate;
pub mod config;
pub mod defaults;
pub mod emit;
pub mod error;
pub mod ignore;
pub mod output;
pub mod path;
pub mod reconcile;
pub mod resolve;
pub mod suggestions;
pub mod version;
pub mod vivado;

#[cfg(test)]
mod path_proptest;
