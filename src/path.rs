//! # Project Paths
//!
//! Every file vivamir talks about is identified by a [`ProjectPath`]: a
//! normalized, `/`-separated path relative to one [`ProjectRoot`]. The value
//! itself never touches the filesystem. Asking whether it exists, or where it
//! lives on disk, is done with [`exists_in`] and [`absolute_in`], which take
//! the root explicitly. The same value can therefore be checked against the
//! versioned source tree and against the tool's scratch workspace.
//!
//! ## Ordering
//!
//! `ProjectPath` implements a total order meant for humans reading generated
//! file lists. Paths are compared by, in turn:
//!
//! 1. the names of their parent directories, outermost first,
//! 2. their depth,
//! 3. the number of suffixes of the file name (`a.tar.gz` has two),
//! 4. the number of `*` characters in the file name,
//! 5. the file name itself.
//!
//! Files of a directory are therefore listed before the contents of its
//! subdirectories, and patterns sort after the literal names they cover.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use crate::defaults::PROJECT_MANIFEST;
use crate::error::{Error, Result};

/// The canonical, absolute directory a project lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    path: PathBuf,
}

impl ProjectRoot {
    /// Canonicalize `path` and use it as a project root.
    ///
    /// The directory must exist.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical = fs::canonicalize(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::MissingPath {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        Ok(Self { path: canonical })
    }

    /// Walk up from `start` until a directory holding a project manifest is
    /// found.
    pub fn discover<P: AsRef<Path>>(start: P) -> Result<Self> {
        let start = start.as_ref();
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir.join(PROJECT_MANIFEST).is_file() {
                log::debug!("found project manifest in {}", dir.display());
                return Self::new(dir);
            }
            current = dir.parent();
        }
        Err(Error::ProjectNotFound {
            start: start.to_path_buf(),
        })
    }

    /// The absolute path of the root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve `candidate` against this root, see [`ProjectPath::new`].
    pub fn project_path<P: AsRef<Path>>(&self, candidate: P) -> Result<ProjectPath> {
        ProjectPath::new(self, candidate)
    }
}

impl AsRef<Path> for ProjectRoot {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// A path relative to a project root, in canonical `/`-separated form.
///
/// Equality and hashing use the canonical string, so two values built from
/// different spellings of the same location (`src/./a.v`, `src/b/../a.v`)
/// collapse into one set entry.
#[derive(Debug, Clone)]
pub struct ProjectPath {
    rel: String,
}

impl ProjectPath {
    /// Resolve `candidate` against `root`.
    ///
    /// Relative candidates are joined onto the root, absolute ones are taken
    /// as they are. `.` and `..` are folded lexically; if the result exists on
    /// disk its symlinks are resolved too. Fails with
    /// [`Error::PathOutsideProject`] when the result is not below the root.
    pub fn new<P: AsRef<Path>>(root: &ProjectRoot, candidate: P) -> Result<Self> {
        let joined = root.path().join(candidate.as_ref());
        let mut resolved = normalize(&joined);
        if resolved.exists() {
            resolved = fs::canonicalize(&resolved)?;
        }

        let relative = resolved
            .strip_prefix(root.path())
            .map_err(|_| Error::PathOutsideProject {
                path: resolved.clone(),
                root: root.path().to_path_buf(),
            })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            let segment = component.as_os_str().to_str().ok_or_else(|| Error::ConfigParse {
                message: format!("Path '{}' is not valid UTF-8", relative.display()),
                hint: None,
            })?;
            segments.push(segment);
        }

        Ok(Self {
            rel: segments.join("/"),
        })
    }

    /// Rebuild a path from segments taken from other project paths.
    pub(crate) fn from_segments<'s>(segments: impl IntoIterator<Item = &'s str>) -> Self {
        Self {
            rel: segments.into_iter().collect::<Vec<_>>().join("/"),
        }
    }

    /// The canonical `/`-separated form. Empty for the root itself.
    pub fn as_str(&self) -> &str {
        &self.rel
    }

    /// Iterate over the path segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.rel.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The final segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// The file name without its final suffix.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => Some(name),
            Some(idx) => Some(&name[..idx]),
        }
    }

    /// The final suffix of the file name, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// The containing directory, `None` for the root itself.
    pub fn parent(&self) -> Option<ProjectPath> {
        if self.rel.is_empty() {
            return None;
        }
        let parent = match self.rel.rfind('/') {
            Some(idx) => self.rel[..idx].to_string(),
            None => String::new(),
        };
        Some(Self { rel: parent })
    }

    fn sort_key(&self) -> SortKey<'_> {
        let segments: Vec<&str> = self.segments().collect();
        let (name, dirs) = match segments.split_last() {
            Some((name, dirs)) => (*name, dirs.to_vec()),
            None => ("", Vec::new()),
        };
        SortKey {
            depth: segments.len(),
            suffixes: suffix_count(name),
            wildcards: name.matches('*').count(),
            dirs,
            name,
        }
    }
}

/// Sorting key, field order is comparison order.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct SortKey<'a> {
    dirs: Vec<&'a str>,
    depth: usize,
    suffixes: usize,
    wildcards: usize,
    name: &'a str,
}

impl PartialEq for ProjectPath {
    fn eq(&self, other: &Self) -> bool {
        self.rel == other.rel
    }
}

impl Eq for ProjectPath {}

impl Hash for ProjectPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rel.hash(state);
    }
}

impl Ord for ProjectPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ProjectPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rel)
    }
}

/// Whether `path` exists below `root`.
pub fn exists_in<R: AsRef<Path>>(path: &ProjectPath, root: R) -> bool {
    absolute_in(path, root).exists()
}

/// The location of `path` below `root`.
pub fn absolute_in<R: AsRef<Path>>(path: &ProjectPath, root: R) -> PathBuf {
    let mut absolute = root.as_ref().to_path_buf();
    absolute.extend(path.segments());
    absolute
}

/// Lexically fold `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Number of suffixes of a file name, `archive.tar.gz` has two, `.bashrc` none.
fn suffix_count(name: &str) -> usize {
    if name.ends_with('.') {
        return 0;
    }
    name.trim_start_matches('.').split('.').count() - 1
}
