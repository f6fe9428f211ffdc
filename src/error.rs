//! # Error Handling
//!
//! This module defines the centralized error type for `vivamir`. It uses the
//! `thiserror` library to describe every failure the project assembly engine
//! can run into, each variant carrying the path or reference that caused it so
//! a manifest can be fixed without re-running in verbose mode.
//!
//! ## Fail-fast and best-effort errors
//!
//! Errors raised while loading manifests, resolving references or aggregating
//! libraries abort the whole operation: a partially merged project must never
//! drive the external tool.
//!
//! Errors raised by the export reconciler are collected instead. The variants
//! `AmbiguousCommonRoot`, `MissingToolSubtree` and `Copy` usually end up inside
//! a [`crate::reconcile::ReconcileReport`] rather than being returned with `?`.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::FilesetKind;

/// Main error type for vivamir operations
#[derive(Error, Debug)]
pub enum Error {
    /// A path resolved to a location that is not below the project root.
    #[error("Path '{}' resolves outside of the project root '{}'", path.display(), root.display())]
    PathOutsideProject { path: PathBuf, root: PathBuf },

    /// A declared path does not exist on disk.
    #[error("Path '{}' does not exist", path.display())]
    MissingPath { path: PathBuf },

    /// An `exec` reference could not be turned into a path.
    #[error("Failed to resolve reference `{reference}`: {message}")]
    ReferenceResolution { reference: String, message: String },

    /// The ignore configuration sets both or neither of `include` and `list`.
    #[error("Invalid ignore configuration: {message}")]
    ConflictingIgnoreConfig { message: String },

    /// A trusted sub-design is not a Tcl script.
    #[error("Sub-design '{}' must have a '.tcl' suffix", path.display())]
    InvalidSubdesign { path: PathBuf },

    /// The common root of a fileset cannot be inferred.
    #[error("Cannot infer the common root of the {kind} fileset: {message}")]
    AmbiguousCommonRoot { kind: FilesetKind, message: String },

    /// The tool workspace does not contain the subtree reconciliation expects.
    #[error("Expected {kind} subtree '{}' does not exist in the tool workspace", path.display())]
    MissingToolSubtree { kind: FilesetKind, path: PathBuf },

    /// A single file could not be copied back into the versioned tree.
    #[error("Failed to copy '{}' to '{}': {message}", src.display(), dst.display())]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        message: String,
    },

    /// A manifest could not be parsed or failed validation.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// The manifest was written for an incompatible major version.
    #[error("Manifest version {found} is not compatible with vivamir {expected}")]
    IncompatibleVersion { found: String, expected: String },

    /// No `vivamir.toml` was found walking up from the start directory.
    #[error("No vivamir project found in '{}' or any parent directory", start.display())]
    ProjectNotFound { start: PathBuf },

    /// The external tool could not be started or exited with an error.
    #[error("Tool invocation failed: {command} - {message}")]
    ToolInvocation { command: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A TOML serialization error, wrapped from `toml::ser::Error`.
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A YAML serialization error, wrapped from `serde_yaml::Error`.
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// An error while walking glob matches, wrapped from `glob::GlobError`.
    #[error("Glob expansion error: {0}")]
    GlobWalk(#[from] glob::GlobError),

    /// A directory traversal error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
