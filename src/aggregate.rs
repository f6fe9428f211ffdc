//! # Library Aggregator
//!
//! Merges the project manifest and every library manifest of a workspace into
//! one [`AggregatedProject`]:
//!
//! 1. Libraries are discovered as `<workspace>/<dir>/vivamir.lib.toml`, one per
//!    immediate subdirectory, visited in directory-name order.
//! 2. Every include, fileset and trusted sub-design reference is resolved.
//!    Fileset directories contribute every regular file below them.
//! 3. Files are unioned per [`FilesetKind`], includes into a single set.
//! 4. The project's ignore set is resolved and subtracted by exact match.
//!
//! Aggregation is fail-fast: the first error aborts it, since a partially
//! merged project must not be handed to the tool. The result holds sets, not
//! lists. Ordering is applied when scripts are emitted.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use walkdir::WalkDir;

use crate::config::{self, FilesetKind, Fileset, LibraryManifest, ProjectManifest, Target};
use crate::defaults::{LIBRARY_MANIFEST, SUBDESIGN_SUFFIX};
use crate::error::{Error, Result};
use crate::ignore::{IgnoreSet, ResolvedIgnore};
use crate::path::{absolute_in, ProjectPath, ProjectRoot};
use crate::resolve::Resolver;

/// One library of the workspace.
#[derive(Debug, Clone)]
pub struct Library {
    /// Directory name of the library inside the workspace.
    pub name: String,
    /// Library directory, relative to the project root.
    pub dir: ProjectPath,
    pub manifest: LibraryManifest,
}

impl Library {
    /// Load the library living in `dir`.
    pub fn load(root: &ProjectRoot, dir: &Path) -> Result<Self> {
        let manifest = config::load_library(&dir.join(LIBRARY_MANIFEST))?;
        let dir = ProjectPath::new(root, dir)?;
        let name = dir.file_name().unwrap_or_default().to_string();
        Ok(Self {
            name,
            dir,
            manifest,
        })
    }
}

/// A trusted sub-design script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdesign {
    /// Name the design is created under, the script's file stem.
    pub name: String,
    pub source: ProjectPath,
}

/// The merged view of a project and all its libraries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedProject {
    /// Files per fileset kind, ignored files already removed.
    pub files: BTreeMap<FilesetKind, HashSet<ProjectPath>>,
    /// Include directories.
    pub includes: HashSet<ProjectPath>,
    /// Trusted sub-designs, in path order.
    pub subdesigns: Vec<Subdesign>,
    /// Files contributed by filesets marked `read_only`.
    pub read_only: HashSet<ProjectPath>,
    /// Where files the tool creates for each kind are exported to.
    pub destinations: BTreeMap<FilesetKind, ProjectPath>,
    /// The resolved ignore configuration.
    pub ignored: ResolvedIgnore,
}

impl AggregatedProject {
    /// Files of `kind`, in no particular order.
    pub fn files(&self, kind: FilesetKind) -> impl Iterator<Item = &ProjectPath> {
        self.files.get(&kind).into_iter().flatten()
    }

    /// Files of `kind` in [`ProjectPath`] order.
    pub fn sorted_files(&self, kind: FilesetKind) -> Vec<&ProjectPath> {
        let mut paths: Vec<&ProjectPath> = self.files(kind).collect();
        paths.sort();
        paths
    }

    /// Include directories in [`ProjectPath`] order.
    pub fn sorted_includes(&self) -> Vec<&ProjectPath> {
        sorted(&self.includes)
    }
}

fn sorted(set: &HashSet<ProjectPath>) -> Vec<&ProjectPath> {
    let mut paths: Vec<&ProjectPath> = set.iter().collect();
    paths.sort();
    paths
}

/// Find every library below `workspace`, sorted by directory name.
///
/// A missing workspace directory yields no libraries.
pub fn discover_libraries(root: &ProjectRoot, workspace: &Path) -> Result<Vec<Library>> {
    let workspace = root.path().join(workspace);
    if !workspace.is_dir() {
        log::warn!("workspace directory {} does not exist", workspace.display());
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(&workspace)? {
        let path = entry?.path();
        if path.join(LIBRARY_MANIFEST).is_file() {
            dirs.push(path);
        } else if path.is_dir() {
            log::debug!("skipping {}, no {}", path.display(), LIBRARY_MANIFEST);
        }
    }
    dirs.sort();

    let libraries = dirs
        .iter()
        .map(|dir| Library::load(root, dir))
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "discovered {} libraries in {}",
        libraries.len(),
        workspace.display()
    );
    Ok(libraries)
}

/// Load the project at `root` and aggregate it.
pub fn aggregate(root: &ProjectRoot) -> Result<AggregatedProject> {
    let mut manifest = config::load_project(root)?;
    let mut libraries = discover_libraries(root, &manifest.workspace)?;
    aggregate_with(root, &mut manifest, &mut libraries)
}

/// Aggregate an already loaded project manifest and its libraries.
///
/// References are resolved in place, so running this twice over the same
/// manifests does not run any `exec` command a second time. The result does
/// not depend on the order of `libraries`.
pub fn aggregate_with(
    root: &ProjectRoot,
    manifest: &mut ProjectManifest,
    libraries: &mut [Library],
) -> Result<AggregatedProject> {
    let mut merge = Merge::default();

    let project = Resolver::new(root);
    merge.filesets(root, &project, &mut manifest.filesets)?;
    merge.includes(&project, &mut manifest.includes)?;
    merge.subdesigns(root, &project, &mut manifest.block_designs.trusted)?;
    for kind in FilesetKind::ALL {
        if let Some(fileset) = manifest.first_fileset(kind) {
            if let Some(path) = fileset.target.resolution.resolved() {
                merge.destinations.insert(kind, (String::new(), path.clone()));
            }
        }
    }

    for library in libraries.iter_mut() {
        log::debug!("merging library '{}'", library.name);
        let resolver = Resolver::with_base(root, library.dir.as_str());
        merge.filesets(root, &resolver, &mut library.manifest.filesets)?;
        merge.includes(&resolver, &mut library.manifest.includes)?;
        merge.subdesigns(root, &resolver, &mut library.manifest.block_designs.trusted)?;
        merge.library_destinations(library);
    }

    let ignored = IgnoreSet::from_section(manifest.ignore.as_ref())?.resolve(root)?;
    Ok(merge.finish(ignored))
}

/// Accumulator for one aggregation run.
#[derive(Default)]
struct Merge {
    files: BTreeMap<FilesetKind, HashSet<ProjectPath>>,
    includes: HashSet<ProjectPath>,
    subdesigns: HashSet<ProjectPath>,
    read_only: HashSet<ProjectPath>,
    /// Chosen destination per kind with the name of the library it came
    /// from. The project manifest uses the empty name and always wins.
    destinations: BTreeMap<FilesetKind, (String, ProjectPath)>,
}

impl Merge {
    fn filesets(
        &mut self,
        root: &ProjectRoot,
        resolver: &Resolver<'_>,
        filesets: &mut [Fileset],
    ) -> Result<()> {
        for fileset in filesets.iter_mut() {
            let dir = resolver.resolve_target(&mut fileset.target)?;
            let files = enumerate(root, &dir)?;
            log::debug!(
                "{} fileset {} contributes {} files",
                fileset.kind,
                dir,
                files.len()
            );
            if fileset.read_only {
                self.read_only.extend(files.iter().cloned());
            }
            self.files.entry(fileset.kind).or_default().extend(files);
        }
        Ok(())
    }

    fn includes(&mut self, resolver: &Resolver<'_>, includes: &mut [Target]) -> Result<()> {
        for include in includes.iter_mut() {
            self.includes.insert(resolver.resolve_target(include)?);
        }
        Ok(())
    }

    fn subdesigns(
        &mut self,
        root: &ProjectRoot,
        resolver: &Resolver<'_>,
        trusted: &mut [Target],
    ) -> Result<()> {
        for target in trusted.iter_mut() {
            let path = resolver.resolve_target(target)?;
            if absolute_in(&path, root).is_dir() {
                let scripts = enumerate(root, &path)?
                    .into_iter()
                    .filter(|p| p.extension() == Some(SUBDESIGN_SUFFIX));
                self.subdesigns.extend(scripts);
            } else if path.extension() == Some(SUBDESIGN_SUFFIX) {
                self.subdesigns.insert(path);
            } else {
                return Err(Error::InvalidSubdesign {
                    path: absolute_in(&path, root),
                });
            }
        }
        Ok(())
    }

    /// Offer the first writable fileset of each kind as destination, the
    /// library with the smallest name wins.
    fn library_destinations(&mut self, library: &Library) {
        for kind in FilesetKind::ALL {
            let path = match library.manifest.first_fileset(kind) {
                Some(fileset) => match fileset.target.resolution.resolved() {
                    Some(path) => path.clone(),
                    None => continue,
                },
                None => continue,
            };
            let replace = match self.destinations.get(&kind) {
                None => true,
                Some((owner, _)) => !owner.is_empty() && library.name < *owner,
            };
            if replace {
                self.destinations.insert(kind, (library.name.clone(), path));
            }
        }
    }

    fn finish(mut self, ignored: ResolvedIgnore) -> AggregatedProject {
        for kind in FilesetKind::ALL {
            let files = self.files.entry(kind).or_default();
            let before = files.len();
            files.retain(|path| !ignored.paths.contains(path));
            log::info!(
                "{} fileset: {} files ({} ignored)",
                kind,
                files.len(),
                before - files.len()
            );
        }
        self.read_only.retain(|path| !ignored.paths.contains(path));

        let mut sources: Vec<ProjectPath> = self.subdesigns.into_iter().collect();
        sources.sort();
        let subdesigns = sources
            .into_iter()
            .map(|source| Subdesign {
                name: source.file_stem().unwrap_or_default().to_string(),
                source,
            })
            .collect();

        AggregatedProject {
            files: self.files,
            includes: self.includes,
            subdesigns,
            read_only: self.read_only,
            destinations: self
                .destinations
                .into_iter()
                .map(|(kind, (_, path))| (kind, path))
                .collect(),
            ignored,
        }
    }
}

/// Every regular file at or below `path`.
fn enumerate(root: &ProjectRoot, path: &ProjectPath) -> Result<Vec<ProjectPath>> {
    let absolute = absolute_in(path, root);
    if absolute.is_file() {
        return Ok(vec![path.clone()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&absolute).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(ProjectPath::new(root, entry.path())?);
        }
    }
    Ok(files)
}
