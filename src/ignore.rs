//! # Ignore Configuration
//!
//! A project names the files it wants left out of every fileset either with
//! an explicit list of glob patterns or with a line-oriented ignore file:
//!
//! ```toml
//! [ignore]
//! include = "vivamir.ignore"   # or: list = ["workspace/*/src/scratch_*.v"]
//! ```
//!
//! Exactly one of the two forms must be configured. Patterns are relative to
//! the project root. In an ignore file blank lines and lines starting with `#`
//! are skipped.
//!
//! Globbing happens only here, while the ignore set is resolved. The
//! aggregator then subtracts the resulting concrete paths by exact match.

use std::collections::HashSet;
use std::path::PathBuf;

use glob::Pattern;

use crate::config::IgnoreSection;
use crate::defaults::IGNORE_COMMENT;
use crate::error::{Error, Result};
use crate::path::{ProjectPath, ProjectRoot};

/// A validated ignore configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreSet {
    /// Patterns written directly in the manifest.
    List(Vec<String>),
    /// Patterns read from a file, relative to the project root.
    File(PathBuf),
}

/// An ignore configuration after glob expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIgnore {
    /// The patterns as configured, in declaration order.
    pub patterns: Vec<String>,
    /// Every existing path matched by at least one pattern.
    pub paths: HashSet<ProjectPath>,
}

impl IgnoreSet {
    /// Validate the `[ignore]` table. A missing table counts as neither form
    /// being set.
    pub fn from_section(section: Option<&IgnoreSection>) -> Result<Self> {
        match section {
            Some(section) => Self::from_parts(section.include.clone(), section.list.clone()),
            None => Self::from_parts(None, None),
        }
    }

    pub fn from_parts(include: Option<PathBuf>, list: Option<Vec<String>>) -> Result<Self> {
        match (include, list) {
            (Some(file), None) => Ok(IgnoreSet::File(file)),
            (None, Some(list)) => Ok(IgnoreSet::List(list)),
            (Some(file), Some(_)) => Err(Error::ConflictingIgnoreConfig {
                message: format!(
                    "both `include` ('{}') and `list` are set, keep only one",
                    file.display()
                ),
            }),
            (None, None) => Err(Error::ConflictingIgnoreConfig {
                message: "one of `include` or `list` must be set in [ignore]".to_string(),
            }),
        }
    }

    /// The configured patterns, reading the ignore file if there is one.
    pub fn patterns(&self, root: &ProjectRoot) -> Result<Vec<String>> {
        match self {
            IgnoreSet::List(list) => Ok(list.clone()),
            IgnoreSet::File(file) => {
                let path = root.path().join(file);
                let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => Error::MissingPath { path: path.clone() },
                    _ => Error::Io(e),
                })?;
                Ok(parse_ignore_file(&content))
            }
        }
    }

    /// Glob-expand every pattern against the project root.
    pub fn resolve(&self, root: &ProjectRoot) -> Result<ResolvedIgnore> {
        let patterns = self.patterns(root)?;
        let mut paths = HashSet::new();
        for pattern in &patterns {
            let before = paths.len();
            paths.extend(expand(root, pattern)?);
            if paths.len() == before {
                log::debug!("ignore pattern '{}' matched nothing new", pattern);
            }
        }
        log::debug!(
            "{} ignore patterns expanded to {} paths",
            patterns.len(),
            paths.len()
        );
        Ok(ResolvedIgnore { patterns, paths })
    }
}

/// Extract the patterns of an ignore file.
pub fn parse_ignore_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(IGNORE_COMMENT))
        .map(str::to_string)
        .collect()
}

/// Every existing path below `root` matching `pattern`.
pub fn expand(root: &ProjectRoot, pattern: &str) -> Result<Vec<ProjectPath>> {
    let base = root.path().to_str().ok_or_else(|| Error::ConfigParse {
        message: format!("Project root '{}' is not valid UTF-8", root.path().display()),
        hint: None,
    })?;
    // Metacharacters in the root itself must not take part in matching.
    let full = format!("{}/{}", Pattern::escape(base), pattern);

    let mut matches = Vec::new();
    for entry in glob::glob(&full)? {
        matches.push(ProjectPath::new(root, entry?)?);
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, ProjectRoot) {
        let temp = TempDir::new().unwrap();
        for file in [
            "workspace/core/src/top.v",
            "workspace/core/src/scratch_a.v",
            "workspace/core/src/scratch_b.v",
            "workspace/vendor/ip/ip.v",
        ] {
            let path = temp.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        let root = ProjectRoot::new(temp.path()).unwrap();
        (temp, root)
    }

    #[test]
    fn test_both_forms_conflict() {
        let err = IgnoreSet::from_parts(
            Some(PathBuf::from("vivamir.ignore")),
            Some(vec!["*.v".to_string()]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConflictingIgnoreConfig { .. }));
        assert!(err.to_string().contains("vivamir.ignore"));
    }

    #[test]
    fn test_neither_form_conflicts() {
        let err = IgnoreSet::from_parts(None, None).unwrap_err();
        assert!(matches!(err, Error::ConflictingIgnoreConfig { .. }));
    }

    #[test]
    fn test_missing_section_conflicts() {
        let err = IgnoreSet::from_section(None).unwrap_err();
        assert!(matches!(err, Error::ConflictingIgnoreConfig { .. }));
    }

    #[test]
    fn test_empty_list_is_valid() {
        let set = IgnoreSet::from_parts(None, Some(vec![])).unwrap();
        assert_eq!(set, IgnoreSet::List(vec![]));
    }

    #[test]
    fn test_parse_ignore_file() {
        let content = "# generated scratch\n\nworkspace/*/src/scratch_*.v\n  \n  # indented comment\nworkspace/vendor/ip/ip.v\n";
        assert_eq!(
            parse_ignore_file(content),
            vec!["workspace/*/src/scratch_*.v", "workspace/vendor/ip/ip.v"]
        );
    }

    #[test]
    fn test_resolve_list_expands_globs() {
        let (_temp, root) = project();
        let set = IgnoreSet::List(vec!["workspace/*/src/scratch_*.v".to_string()]);
        let resolved = set.resolve(&root).unwrap();

        let mut paths: Vec<String> = resolved.paths.iter().map(|p| p.to_string()).collect();
        paths.sort();
        assert_eq!(
            paths,
            vec!["workspace/core/src/scratch_a.v", "workspace/core/src/scratch_b.v"]
        );
        assert_eq!(resolved.patterns, vec!["workspace/*/src/scratch_*.v"]);
    }

    #[test]
    fn test_resolve_file() {
        let (temp, root) = project();
        fs::write(
            temp.path().join("vivamir.ignore"),
            "# vendor code\nworkspace/vendor/ip/ip.v\n",
        )
        .unwrap();
        let set = IgnoreSet::File(PathBuf::from("vivamir.ignore"));
        let resolved = set.resolve(&root).unwrap();
        assert_eq!(resolved.paths.len(), 1);
        assert!(resolved
            .paths
            .contains(&root.project_path("workspace/vendor/ip/ip.v").unwrap()));
    }

    #[test]
    fn test_resolve_missing_file() {
        let (_temp, root) = project();
        let err = IgnoreSet::File(PathBuf::from("missing.ignore"))
            .resolve(&root)
            .unwrap_err();
        assert!(matches!(err, Error::MissingPath { .. }));
    }

    #[test]
    fn test_pattern_matching_nothing() {
        let (_temp, root) = project();
        let resolved = IgnoreSet::List(vec!["nowhere/*.v".to_string()])
            .resolve(&root)
            .unwrap();
        assert!(resolved.paths.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let (_temp, root) = project();
        let err = IgnoreSet::List(vec!["workspace/[".to_string()])
            .resolve(&root)
            .unwrap_err();
        assert!(matches!(err, Error::Glob(_)));
    }

    #[test]
    fn test_root_with_metacharacters() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fpga[rev2]");
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src/top.v"), "").unwrap();
        let root = ProjectRoot::new(&dir).unwrap();

        let matches = expand(&root, "src/*.v").unwrap();
        assert_eq!(matches, vec![root.project_path("src/top.v").unwrap()]);
    }
}
