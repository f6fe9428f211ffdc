//! # Error Suggestions
//!
//! Helper functions that turn the errors users hit most often into messages
//! that say what went wrong and how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vivamir::suggestions;
//!
//! let project = vivamir::aggregate::aggregate(&root).map_err(suggestions::from_error)?;
//! ```

use std::path::Path;

use crate::defaults::{IGNORE_FILE, PROJECT_MANIFEST, VIVADO_ENV};
use crate::error::Error;

/// Generate an error for when no project manifest is found.
pub fn project_not_found(start: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "No vivamir project found in {start} or any parent directory\n\n\
         hint: Run 'vivamir init' to create a {PROJECT_MANIFEST} here\n\
         hint: Change into a directory below an existing project",
        start = start.display()
    )
}

/// Generate an error for when Vivado cannot be started.
pub fn vivado_not_found(command: &str, message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Failed to start Vivado with '{command}': {message}\n\n\
         hint: Source the Vivado settings script so that 'vivado' is on PATH\n\
         hint: Use --vivado <COMMAND> or set {VIVADO_ENV} to point at the executable"
    )
}

/// Generate an error for a manifest written for another major version.
pub fn incompatible_version(found: &str, expected: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Manifest version {found} is not compatible with vivamir {expected}\n\n\
         hint: Install a vivamir release matching the manifest's major version\n\
         hint: Or update the 'version' field after migrating the manifest"
    )
}

/// Generate an error for an ignore section that sets both or neither source.
pub fn conflicting_ignore(message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid ignore configuration: {message}\n\n\
         hint: Set exactly one of 'include' (a file such as {IGNORE_FILE}) or 'list'\n\
         hint: Use 'list = []' to ignore nothing"
    )
}

/// Generate an error for a trusted sub-design that is not a Tcl script.
pub fn invalid_subdesign(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Sub-design {path} must have a '.tcl' suffix\n\n\
         hint: Export the block design with 'vivamir export' to produce its .tcl script\n\
         hint: Or list the directory that holds the scripts instead",
        path = path.display()
    )
}

/// Generate an error for an export that left files behind.
pub fn export_incomplete(errors: usize) -> anyhow::Error {
    anyhow::anyhow!(
        "Export finished with {errors} error(s); some files were not copied back\n\n\
         hint: Declare a writable fileset in {PROJECT_MANIFEST} to receive new files\n\
         hint: Run 'vivamir export --skip-tool' to retry the copy without Vivado"
    )
}

/// Convert a library error into an `anyhow` error, adding hints where known.
pub fn from_error(error: Error) -> anyhow::Error {
    match error {
        Error::ProjectNotFound { start } => project_not_found(&start),
        Error::ToolInvocation { command, message } => vivado_not_found(&command, &message),
        Error::IncompatibleVersion { found, expected } => {
            incompatible_version(&found, &expected)
        }
        Error::ConflictingIgnoreConfig { message } => conflicting_ignore(&message),
        Error::InvalidSubdesign { path } => invalid_subdesign(&path),
        other => anyhow::Error::new(other),
    }
}
