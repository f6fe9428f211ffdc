//! # Reference Resolver
//!
//! Turns a declared [`Reference`] into a [`ProjectPath`].
//!
//! - A literal path is joined onto the directory of the manifest that
//!   declared it, must stay inside the project root and must exist.
//! - An `exec` command is run through the platform shell with the manifest's
//!   directory as working directory. It must exit successfully and print
//!   exactly one non-empty line naming an existing path.
//!
//! Resolution state lives with the owner of the reference: a
//! [`Target`] starts out [`Resolution::Unresolved`] and is moved to
//! [`Resolution::Resolved`] by [`Resolver::resolve_target`]. Once resolved, a
//! target is never resolved again, so an `exec` command runs at most once per
//! loaded manifest.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{Reference, Target};
use crate::error::{Error, Result};
use crate::path::{ProjectPath, ProjectRoot};

/// Resolution state of a declared reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Resolution {
    #[default]
    Unresolved,
    Resolved(ProjectPath),
}

impl Resolution {
    pub fn resolved(&self) -> Option<&ProjectPath> {
        match self {
            Resolution::Resolved(path) => Some(path),
            Resolution::Unresolved => None,
        }
    }
}

/// Resolves references declared by one manifest.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    root: &'a ProjectRoot,
    base: PathBuf,
}

impl<'a> Resolver<'a> {
    /// A resolver for references declared in the project manifest.
    pub fn new(root: &'a ProjectRoot) -> Self {
        Self {
            root,
            base: root.path().to_path_buf(),
        }
    }

    /// A resolver for references declared in a manifest living in `base`.
    pub fn with_base<P: AsRef<Path>>(root: &'a ProjectRoot, base: P) -> Self {
        Self {
            root,
            base: root.path().join(base.as_ref()),
        }
    }

    /// Resolve `target` unless it already is, and return its path.
    pub fn resolve_target(&self, target: &mut Target) -> Result<ProjectPath> {
        let path = match &target.resolution {
            Resolution::Resolved(path) => return Ok(path.clone()),
            Resolution::Unresolved => self.resolve(&target.reference)?,
        };
        target.resolution = Resolution::Resolved(path.clone());
        Ok(path)
    }

    /// Resolve a reference. This does not cache anything; use
    /// [`Resolver::resolve_target`] for resolve-once semantics.
    pub fn resolve(&self, reference: &Reference) -> Result<ProjectPath> {
        match reference {
            Reference::Path(path) => self.resolve_literal(path),
            Reference::Exec(command) => self.resolve_exec(reference, command),
        }
    }

    fn resolve_literal(&self, path: &Path) -> Result<ProjectPath> {
        let candidate = self.base.join(path);
        let resolved = ProjectPath::new(self.root, &candidate)?;
        if !candidate.exists() {
            return Err(Error::MissingPath { path: candidate });
        }
        Ok(resolved)
    }

    fn resolve_exec(&self, reference: &Reference, command: &str) -> Result<ProjectPath> {
        log::debug!("running `{}` in {}", command, self.base.display());
        let failure = |message: String| Error::ReferenceResolution {
            reference: reference.to_string(),
            message,
        };

        let output = shell(command)
            .current_dir(&self.base)
            .output()
            .map_err(|e| failure(format!("failed to start: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let line = match lines.as_slice() {
            [line] => *line,
            [] => return Err(failure("produced no output".to_string())),
            many => {
                return Err(failure(format!(
                    "printed {} lines, expected a single path",
                    many.len()
                )))
            }
        };

        let candidate = self.base.join(line);
        if !candidate.exists() {
            return Err(failure(format!(
                "printed '{}' which does not exist",
                candidate.display()
            )));
        }
        ProjectPath::new(self.root, &candidate)
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
