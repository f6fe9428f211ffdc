//! # Manifest Model
//!
//! This module defines the typed form of the two manifest files a vivamir
//! project is made of, and the logic for parsing them.
//!
//! - **`vivamir.toml`** ([`ProjectManifest`]) sits at the project root and
//!   carries the project name, top modules, ignore configuration, Vivado
//!   settings and any project-level filesets.
//! - **`vivamir.lib.toml`** ([`LibraryManifest`]) sits in each immediate
//!   subdirectory of the workspace directory and declares that library's
//!   filesets, include directories and trusted sub-designs.
//!
//! Every table rejects unknown keys. Paths in a library manifest are relative
//! to the library directory; paths in the project manifest are relative to the
//! project root.
//!
//! ## References
//!
//! Files and directories are declared through a [`Reference`]: either a
//! literal `path`, or an `exec` command whose standard output names the path.
//! Exactly one of the two keys must be present, which is checked while
//! deserializing:
//!
//! ```toml
//! includes = ["include", { exec = "find-ip-headers" }]
//!
//! [[filesets]]
//! kind = "design"
//! path = "src"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::ProjectRoot;
use crate::resolve::Resolution;
use crate::{defaults, version};

/// The two kinds of fileset a project carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesetKind {
    Design,
    Simulation,
}

impl FilesetKind {
    /// Every kind, in emission order.
    pub const ALL: [FilesetKind; 2] = [FilesetKind::Design, FilesetKind::Simulation];

    /// The fileset identifier Vivado uses for this kind.
    pub fn tool_name(self) -> &'static str {
        match self {
            FilesetKind::Design => "sources_1",
            FilesetKind::Simulation => "sim_1",
        }
    }
}

impl fmt::Display for FilesetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilesetKind::Design => "Design",
            FilesetKind::Simulation => "Simulation",
        })
    }
}

/// Where a declared file or directory comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A literal path, relative to the manifest's directory.
    Path(PathBuf),
    /// A shell command run in the manifest's directory. Its trimmed standard
    /// output is the path.
    Exec(String),
}

impl Reference {
    /// Build a reference from the two optional manifest keys.
    pub fn from_parts(
        path: Option<PathBuf>,
        exec: Option<String>,
    ) -> std::result::Result<Self, String> {
        match (path, exec) {
            (Some(path), None) => Ok(Reference::Path(path)),
            (None, Some(exec)) => Ok(Reference::Exec(exec)),
            (Some(path), Some(exec)) => Err(format!(
                "exactly one of `path` or `exec` may be set, got path '{}' and exec `{}`",
                path.display(),
                exec
            )),
            (None, None) => Err("exactly one of `path` or `exec` must be set".to_string()),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Path(path) => write!(f, "path '{}'", path.display()),
            Reference::Exec(command) => write!(f, "exec `{}`", command),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReference {
    Bare(PathBuf),
    Table(ReferenceTable),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferenceTable {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    exec: Option<String>,
}

impl TryFrom<RawReference> for Reference {
    type Error = String;

    fn try_from(raw: RawReference) -> std::result::Result<Self, String> {
        match raw {
            RawReference::Bare(path) => Ok(Reference::Path(path)),
            RawReference::Table(table) => Reference::from_parts(table.path, table.exec),
        }
    }
}

/// A declared reference together with its resolution state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawReference")]
pub struct Target {
    pub reference: Reference,
    pub resolution: Resolution,
}

impl Target {
    pub fn new(reference: Reference) -> Self {
        Self {
            reference,
            resolution: Resolution::Unresolved,
        }
    }
}

impl TryFrom<RawReference> for Target {
    type Error = String;

    fn try_from(raw: RawReference) -> std::result::Result<Self, String> {
        Reference::try_from(raw).map(Target::new)
    }
}

/// One fileset entry: a directory (or single file) feeding a fileset kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawFileset")]
pub struct Fileset {
    pub kind: FilesetKind,
    pub target: Target,
    /// Files of a read-only fileset are never written back by an export.
    pub read_only: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileset {
    kind: FilesetKind,
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    exec: Option<String>,
    #[serde(default)]
    read_only: bool,
}

impl TryFrom<RawFileset> for Fileset {
    type Error = String;

    fn try_from(raw: RawFileset) -> std::result::Result<Self, String> {
        Ok(Fileset {
            kind: raw.kind,
            target: Target::new(Reference::from_parts(raw.path, raw.exec)?),
            read_only: raw.read_only,
        })
    }
}

/// The `[ignore]` table as written. Turned into an
/// [`IgnoreSet`](crate::ignore::IgnoreSet) before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreSection {
    /// Path of a line-oriented ignore file, relative to the project root.
    #[serde(default)]
    pub include: Option<PathBuf>,
    /// Glob patterns, relative to the project root.
    #[serde(default)]
    pub list: Option<Vec<String>>,
}

/// `[block_designs]` of the project manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDesigns {
    /// Where block designs created inside the tool are exported to.
    #[serde(default)]
    pub new_design_path: Option<PathBuf>,
    #[serde(default)]
    pub trusted: Vec<Target>,
}

/// `[block_designs]` of a library manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryBlockDesigns {
    #[serde(default)]
    pub trusted: Vec<Target>,
}

/// `[ips]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ips {
    pub user_ip_repo_path: PathBuf,
}

/// A raw `set_property` applied to the tool project after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VivadoProperty {
    pub name: String,
    pub value: String,
    pub object: String,
}

impl VivadoProperty {
    pub fn as_tcl(&self) -> String {
        format!(
            "set_property -name {} -value {} -objects {}",
            self.name, self.value, self.object
        )
    }
}

/// `[vivado]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VivadoSettings {
    /// Supported Vivado version, e.g. `2022.2`.
    pub version: String,
    pub part: String,
    pub board: String,
    pub board_long: String,
    #[serde(default)]
    pub properties: Vec<VivadoProperty>,
}

fn default_workspace() -> PathBuf {
    PathBuf::from(defaults::WORKSPACE_DIR)
}

/// Contents of `vivamir.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    /// Version of vivamir the manifest was written for.
    pub version: String,
    pub name: String,
    pub design_top: String,
    pub simulation_top: String,
    /// Directory whose immediate subdirectories hold libraries.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
    pub filesets: Vec<Fileset>,
    pub includes: Vec<Target>,
    #[serde(default)]
    pub ignore: Option<IgnoreSection>,
    #[serde(default)]
    pub block_designs: BlockDesigns,
    #[serde(default)]
    pub ips: Option<Ips>,
    pub vivado: VivadoSettings,
}

impl ProjectManifest {
    /// The first declared fileset of `kind` that is not read-only.
    pub fn first_fileset(&self, kind: FilesetKind) -> Option<&Fileset> {
        first_writable(&self.filesets, kind)
    }
}

/// Contents of a `vivamir.lib.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryManifest {
    #[serde(default)]
    pub filesets: Vec<Fileset>,
    #[serde(default)]
    pub includes: Vec<Target>,
    #[serde(default)]
    pub block_designs: LibraryBlockDesigns,
}

impl LibraryManifest {
    pub fn first_fileset(&self, kind: FilesetKind) -> Option<&Fileset> {
        first_writable(&self.filesets, kind)
    }
}

fn first_writable(filesets: &[Fileset], kind: FilesetKind) -> Option<&Fileset> {
    filesets.iter().find(|f| f.kind == kind && !f.read_only)
}

/// Parse manifest `content` read from `source`. No version check is done
/// here.
fn parse_manifest<T: DeserializeOwned>(content: &str, source: &Path) -> Result<T> {
    toml::from_str(content).map_err(|e| parse_error(&source.display().to_string(), e))
}

/// Load `vivamir.toml` from `root` and check that its version is compatible
/// with the running vivamir.
pub fn load_project(root: &ProjectRoot) -> Result<ProjectManifest> {
    let path = root.path().join(defaults::PROJECT_MANIFEST);
    let content = read_manifest(&path)?;
    let manifest: ProjectManifest = parse_manifest(&content, &path)?;
    version::check_compatible(&manifest.version)?;
    log::debug!("loaded project '{}' from {}", manifest.name, path.display());
    Ok(manifest)
}

/// Load a library manifest from a file path.
pub fn load_library(path: &Path) -> Result<LibraryManifest> {
    let content = read_manifest(path)?;
    parse_manifest(&content, path)
}

fn read_manifest(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::MissingPath {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })
}

fn parse_error(source: &str, error: toml::de::Error) -> Error {
    let message = error.message().to_string();
    let hint = if message.contains("unknown field") {
        Some("Manifests reject unknown keys, check the spelling".to_string())
    } else if message.contains("`path` or `exec`") {
        Some("Write either `path = \"...\"` or `exec = \"...\"`, not both".to_string())
    } else if message.contains("unknown variant") {
        Some("Fileset kinds are \"design\" and \"simulation\"".to_string())
    } else {
        None
    };
    Error::ConfigParse {
        message: format!("{}: {}", source, error),
        hint,
    }
}
