//! # Export Reconciler
//!
//! Vivado imports every design and simulation file into its own project
//! directory. Edits made in the GUI land in those copies, and files created in
//! the GUI land in a separate `new` directory. Reconciliation copies both back
//! into the versioned tree.
//!
//! The tool places imported files below
//! `<name>.srcs/<fileset>/imports/<dir>`, where `<dir>` is only the last
//! segment of the directory all imported files share. That directory is
//! recovered with [`infer_common_root`], which looks for the first depth at
//! which the paths of a fileset diverge.
//!
//! Reconciliation is best-effort. A fileset kind whose common root cannot be
//! inferred, or whose subtree is missing, is skipped with an error while the
//! other kind is still attempted. A file that cannot be copied is recorded and
//! the remaining files are copied anyway. Everything ends up in a
//! [`ReconcileReport`].

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::aggregate::AggregatedProject;
use crate::config::FilesetKind;
use crate::defaults::{tool_dir, TOOL_PROJECT_DIR};
use crate::error::{Error, Result};
use crate::path::{absolute_in, ProjectPath, ProjectRoot};

/// Directory of imported originals inside a fileset directory.
const IMPORTS_DIR: &str = "imports";
/// Directory of files created inside the tool.
const NEW_FILES_DIR: &str = "new";

/// First line of the critical warning Vivado writes into every block design
/// script exported from a project that is not fully up to date.
const STALE_DESIGN_WARNING: &str =
    "common::send_gid_msg -ssname BD::TCL -id 2052 -severity \"CRITICAL WARNING\"";

/// Find the directory shared by every path of a fileset.
///
/// For each depth the distinct segment names are collected. The first depth
/// with more than one name is where the paths diverge, and the common root is
/// made of the single names found at every depth before it. Paths that
/// diverge right away share the project root itself.
///
/// Fails with [`Error::AmbiguousCommonRoot`] when the paths never diverge
/// (a single file) or when there are none.
pub fn infer_common_root<'p, I>(kind: FilesetKind, paths: I) -> Result<ProjectPath>
where
    I: IntoIterator<Item = &'p ProjectPath>,
{
    let mut levels: Vec<BTreeSet<&str>> = Vec::new();
    let mut count = 0;
    for path in paths {
        count += 1;
        for (depth, segment) in path.segments().enumerate() {
            if levels.len() <= depth {
                levels.push(BTreeSet::new());
            }
            levels[depth].insert(segment);
        }
    }

    let ambiguous = |message: String| Error::AmbiguousCommonRoot { kind, message };
    if count == 0 {
        return Err(ambiguous("the fileset is empty".to_string()));
    }

    let divergence = levels
        .iter()
        .position(|names| names.len() > 1)
        .ok_or_else(|| {
            ambiguous(format!(
                "all {} paths share every segment, a single file does not identify a directory",
                count
            ))
        })?;

    let common = levels[..divergence]
        .iter()
        .filter_map(|names| names.iter().next().copied());
    Ok(ProjectPath::from_segments(common))
}

/// Locations inside the tool's generated project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLayout {
    srcs: PathBuf,
}

impl ToolLayout {
    /// Layout of the project `name` generated below `root`.
    pub fn new(root: &ProjectRoot, name: &str) -> Self {
        Self {
            srcs: tool_dir(root.path())
                .join(TOOL_PROJECT_DIR)
                .join(format!("{}.srcs", name)),
        }
    }

    pub fn fileset_dir(&self, kind: FilesetKind) -> PathBuf {
        self.srcs.join(kind.tool_name())
    }

    /// Where the tool keeps the imported copies of files below `common_root`.
    pub fn imports_dir(&self, kind: FilesetKind, common_root: &ProjectPath) -> PathBuf {
        let dir = self.fileset_dir(kind).join(IMPORTS_DIR);
        match common_root.file_name() {
            Some(name) => dir.join(name),
            None => dir,
        }
    }

    pub fn new_files_dir(&self, kind: FilesetKind) -> PathBuf {
        self.fileset_dir(kind).join(NEW_FILES_DIR)
    }
}

/// How one fileset kind maps between the tool project and the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportMapping {
    pub kind: FilesetKind,
    /// Inferred common root of the kind's files, in the source tree.
    pub common_root: ProjectPath,
    /// Imported copies of the files below `common_root`.
    pub imports: PathBuf,
    /// Files created inside the tool.
    pub new_files: PathBuf,
    /// Directory new files are copied into.
    pub destination: Option<ProjectPath>,
}

/// Compute the mapping for `kind`. Fails if the common root cannot be
/// inferred or the tool did not produce the expected imports subtree.
pub fn export_mapping(
    layout: &ToolLayout,
    project: &AggregatedProject,
    kind: FilesetKind,
) -> Result<ExportMapping> {
    let common_root = infer_common_root(kind, project.files(kind))?;
    let imports = layout.imports_dir(kind, &common_root);
    if !imports.is_dir() {
        return Err(Error::MissingToolSubtree {
            kind,
            path: imports,
        });
    }
    Ok(ExportMapping {
        kind,
        common_root,
        imports,
        new_files: layout.new_files_dir(kind),
        destination: project.destinations.get(&kind).cloned(),
    })
}

/// Outcome of reconciling one fileset kind.
#[derive(Debug, Default)]
pub struct KindReport {
    /// `None` if the kind was skipped.
    pub mapping: Option<ExportMapping>,
    /// Imported files copied back onto their originals.
    pub restored: Vec<ProjectPath>,
    /// New files copied into the destination directory.
    pub created: Vec<ProjectPath>,
    /// Imported files left alone because they belong to a read-only fileset.
    pub skipped: Vec<ProjectPath>,
    pub errors: Vec<Error>,
}

/// Outcome of a whole reconciliation.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub kinds: BTreeMap<FilesetKind, KindReport>,
}

impl ReconcileReport {
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.kinds.values().map(|k| k.errors.len()).sum()
    }

    /// Number of files written into the source tree.
    pub fn copied_count(&self) -> usize {
        self.kinds
            .values()
            .map(|k| k.restored.len() + k.created.len())
            .sum()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.kinds.values().flat_map(|k| k.errors.iter())
    }
}

/// Copy tool-written files of every fileset kind back into the source tree.
pub fn reconcile(
    root: &ProjectRoot,
    layout: &ToolLayout,
    project: &AggregatedProject,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for kind in FilesetKind::ALL {
        report
            .kinds
            .insert(kind, reconcile_kind(root, layout, project, kind));
    }
    log::info!(
        "reconciliation copied {} files with {} errors",
        report.copied_count(),
        report.error_count()
    );
    report
}

fn reconcile_kind(
    root: &ProjectRoot,
    layout: &ToolLayout,
    project: &AggregatedProject,
    kind: FilesetKind,
) -> KindReport {
    let mut report = KindReport::default();
    if project.files(kind).next().is_none() {
        log::info!("no {} files, nothing to reconcile", kind);
        return report;
    }

    let mapping = match export_mapping(layout, project, kind) {
        Ok(mapping) => mapping,
        Err(e) => {
            log::warn!("skipping {} fileset: {}", kind, e);
            report.errors.push(e);
            return report;
        }
    };
    log::debug!(
        "{} imports {} map onto {}",
        kind,
        mapping.imports.display(),
        mapping.common_root
    );

    restore_imports(root, project, &mapping, &mut report);
    copy_new_files(root, &mapping, &mut report);
    report.mapping = Some(mapping);
    report
}

/// Copy the imported subtree onto the common root, leaving read-only files.
fn restore_imports(
    root: &ProjectRoot,
    project: &AggregatedProject,
    mapping: &ExportMapping,
    report: &mut KindReport,
) {
    let base = absolute_in(&mapping.common_root, root);
    for entry in WalkDir::new(&mapping.imports).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.errors.push(e.into());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(&mapping.imports) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let dst = base.join(relative);
        let target = match ProjectPath::new(root, &dst) {
            Ok(target) => target,
            Err(e) => {
                report.errors.push(e);
                continue;
            }
        };

        if project.read_only.contains(&target) {
            log::debug!("{} is read-only, not restored", target);
            report.skipped.push(target);
            continue;
        }
        match copy_file(entry.path(), &dst) {
            Ok(()) => report.restored.push(target),
            Err(e) => {
                log::warn!("{}", e);
                report.errors.push(e);
            }
        }
    }
}

/// Copy new files, flattened, into the destination directory.
fn copy_new_files(root: &ProjectRoot, mapping: &ExportMapping, report: &mut KindReport) {
    if !mapping.new_files.is_dir() {
        log::debug!("no new {} files", mapping.kind);
        return;
    }

    for entry in WalkDir::new(&mapping.new_files).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.errors.push(e.into());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let destination = match &mapping.destination {
            Some(destination) => destination,
            None => {
                report.errors.push(Error::Copy {
                    src: entry.path().to_path_buf(),
                    dst: PathBuf::new(),
                    message: format!(
                        "no writable {} fileset is declared to receive new files",
                        mapping.kind
                    ),
                });
                continue;
            }
        };
        let dst = absolute_in(destination, root).join(entry.file_name());
        let copied = copy_file(entry.path(), &dst).and_then(|()| ProjectPath::new(root, &dst));
        match copied {
            Ok(target) => report.created.push(target),
            Err(e) => {
                log::warn!("{}", e);
                report.errors.push(e);
            }
        }
    }
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let copy_error = |e: std::io::Error| Error::Copy {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(copy_error)?;
    }
    fs::copy(src, dst).map_err(copy_error)?;
    Ok(())
}

/// Remove the stale design warning from an exported block design script.
///
/// Returns `None` when the script does not carry the warning.
pub fn strip_stale_warning(content: &str) -> Option<String> {
    if !content.contains(STALE_DESIGN_WARNING) {
        return None;
    }

    let mut cleaned = String::with_capacity(content.len());
    let mut lines = content.lines().peekable();
    while let Some(line) = lines.next() {
        if line.starts_with(STALE_DESIGN_WARNING) {
            if lines.peek().is_some_and(|next| next.trim().is_empty()) {
                lines.next();
            }
            continue;
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }
    Some(format!("{}\n", cleaned.trim()))
}

/// Strip the stale design warning from the script at `path` in place.
///
/// Returns whether the file was changed.
pub fn clean_block_design(path: &Path) -> Result<bool> {
    let content = fs::read_to_string(path)?;
    match strip_stale_warning(&content) {
        Some(cleaned) => {
            fs::write(path, cleaned)?;
            log::debug!("stripped stale design warning from {}", path.display());
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn root() -> (TempDir, ProjectRoot) {
        let temp = TempDir::new().unwrap();
        let root = ProjectRoot::new(temp.path()).unwrap();
        (temp, root)
    }

    fn paths(root: &ProjectRoot, list: &[&str]) -> Vec<ProjectPath> {
        list.iter().map(|p| root.project_path(p).unwrap()).collect()
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_common_root_diverging_at_depth_one() {
        let (_temp, root) = root();
        let files = paths(&root, &["a/x/1.v", "a/x/2.v", "a/y/3.v"]);
        let common = infer_common_root(FilesetKind::Design, &files).unwrap();
        assert_eq!(common.as_str(), "a");
    }

    #[test]
    fn test_common_root_deeper() {
        let (_temp, root) = root();
        let files = paths(
            &root,
            &["workspace/core/src/top.v", "workspace/core/src/uart/rx.v"],
        );
        let common = infer_common_root(FilesetKind::Design, &files).unwrap();
        assert_eq!(common.as_str(), "workspace/core/src");
    }

    #[test]
    fn test_common_root_mixed_depths() {
        let (_temp, root) = root();
        let files = paths(&root, &["a/x/1.v", "a/2.v"]);
        let common = infer_common_root(FilesetKind::Simulation, &files).unwrap();
        assert_eq!(common.as_str(), "a");
    }

    #[test]
    fn test_common_root_single_file_is_ambiguous() {
        let (_temp, root) = root();
        let files = paths(&root, &["a/1.v"]);
        let err = infer_common_root(FilesetKind::Design, &files).unwrap_err();
        assert!(matches!(
            err,
            Error::AmbiguousCommonRoot {
                kind: FilesetKind::Design,
                ..
            }
        ));
    }

    #[test]
    fn test_common_root_empty_is_ambiguous() {
        let none: Vec<ProjectPath> = Vec::new();
        let err = infer_common_root(FilesetKind::Simulation, &none).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_common_root_diverging_at_root_is_project_root() {
        let (temp, root) = root();
        let files = paths(&root, &["rtl/glue.v", "workspace/core/src/top.v"]);
        let common = infer_common_root(FilesetKind::Design, &files).unwrap();
        assert_eq!(common.as_str(), "");

        let layout = ToolLayout::new(&root, "blinky");
        assert_eq!(
            layout.imports_dir(FilesetKind::Design, &common),
            temp.path()
                .canonicalize()
                .unwrap()
                .join("vivamir/project/blinky.srcs/sources_1/imports")
        );
    }

    #[test]
    fn test_tool_layout() {
        let (temp, root) = root();
        let layout = ToolLayout::new(&root, "blinky");
        let common = root.project_path("workspace/core/src").unwrap();
        let base = temp.path().canonicalize().unwrap();
        assert_eq!(
            layout.imports_dir(FilesetKind::Design, &common),
            base.join("vivamir/project/blinky.srcs/sources_1/imports/src")
        );
        assert_eq!(
            layout.new_files_dir(FilesetKind::Simulation),
            base.join("vivamir/project/blinky.srcs/sim_1/new")
        );
    }

    fn aggregated(root: &ProjectRoot, design: &[&str]) -> AggregatedProject {
        let mut project = AggregatedProject::default();
        project.files.insert(
            FilesetKind::Design,
            paths(root, design).into_iter().collect::<HashSet<_>>(),
        );
        project
    }

    #[test]
    fn test_reconcile_restores_and_creates() {
        let (temp, root) = root();
        let files = [
            "workspace/core/src/top.v",
            "workspace/core/src/uart/rx.v",
            "workspace/core/vendor/ip.v",
        ];
        for file in files {
            write(&temp.path().join(file), "original");
        }
        let mut project = aggregated(&root, &files);
        project
            .read_only
            .insert(root.project_path("workspace/core/vendor/ip.v").unwrap());
        project.destinations.insert(
            FilesetKind::Design,
            root.project_path("workspace/core/src").unwrap(),
        );

        let layout = ToolLayout::new(&root, "blinky");
        let imports = layout.fileset_dir(FilesetKind::Design).join("imports/core");
        write(&imports.join("src/top.v"), "edited");
        write(&imports.join("src/uart/rx.v"), "edited");
        write(&imports.join("vendor/ip.v"), "edited");
        write(
            &layout.new_files_dir(FilesetKind::Design).join("nested/fifo.v"),
            "created",
        );

        let report = reconcile(&root, &layout, &project);
        assert!(!report.has_errors(), "{:?}", report);

        let design = &report.kinds[&FilesetKind::Design];
        assert_eq!(design.restored.len(), 2);
        assert_eq!(design.skipped.len(), 1);
        assert_eq!(design.created.len(), 1);
        assert_eq!(design.created[0].as_str(), "workspace/core/src/fifo.v");

        let read = |file: &str| fs::read_to_string(temp.path().join(file)).unwrap();
        assert_eq!(read("workspace/core/src/top.v"), "edited");
        assert_eq!(read("workspace/core/src/uart/rx.v"), "edited");
        assert_eq!(read("workspace/core/vendor/ip.v"), "original");
        assert_eq!(read("workspace/core/src/fifo.v"), "created");
    }

    #[test]
    fn test_reconcile_project_level_fileset_next_to_library() {
        let (temp, root) = root();
        let files = ["rtl/glue.v", "workspace/core/src/top.v"];
        for file in files {
            write(&temp.path().join(file), "original");
        }
        let project = aggregated(&root, &files);
        let layout = ToolLayout::new(&root, "blinky");
        let imports = layout.fileset_dir(FilesetKind::Design).join("imports");
        write(&imports.join("rtl/glue.v"), "edited");
        write(&imports.join("workspace/core/src/top.v"), "edited");

        let report = reconcile(&root, &layout, &project);
        assert!(!report.has_errors(), "{:?}", report);
        assert_eq!(report.kinds[&FilesetKind::Design].restored.len(), 2);

        let read = |file: &str| fs::read_to_string(temp.path().join(file)).unwrap();
        assert_eq!(read("rtl/glue.v"), "edited");
        assert_eq!(read("workspace/core/src/top.v"), "edited");
    }

    #[test]
    fn test_reconcile_missing_subtree_skips_kind() {
        let (temp, root) = root();
        let files = ["workspace/core/src/top.v", "workspace/core/src/sub.v"];
        for file in files {
            write(&temp.path().join(file), "");
        }
        let project = aggregated(&root, &files);
        let layout = ToolLayout::new(&root, "blinky");

        let report = reconcile(&root, &layout, &project);
        let design = &report.kinds[&FilesetKind::Design];
        assert!(design.mapping.is_none());
        assert!(matches!(
            design.errors[0],
            Error::MissingToolSubtree { .. }
        ));
        // An empty simulation fileset is not an error.
        assert!(report.kinds[&FilesetKind::Simulation].errors.is_empty());
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_reconcile_new_files_without_destination() {
        let (temp, root) = root();
        let files = ["workspace/core/src/top.v", "workspace/core/src/sub.v"];
        for file in files {
            write(&temp.path().join(file), "");
        }
        let project = aggregated(&root, &files);
        let layout = ToolLayout::new(&root, "blinky");
        write(
            &layout.fileset_dir(FilesetKind::Design).join("imports/src/top.v"),
            "",
        );
        write(&layout.new_files_dir(FilesetKind::Design).join("a.v"), "");
        write(&layout.new_files_dir(FilesetKind::Design).join("b.v"), "");

        let report = reconcile(&root, &layout, &project);
        let design = &report.kinds[&FilesetKind::Design];
        assert_eq!(design.restored.len(), 1);
        assert_eq!(design.errors.len(), 2);
        assert!(design
            .errors
            .iter()
            .all(|e| matches!(e, Error::Copy { .. })));
    }

    #[test]
    fn test_strip_stale_warning() {
        let script = "set design_name system\n\ncommon::send_gid_msg -ssname BD::TCL -id 2052 -severity \"CRITICAL WARNING\" \"This Tcl script was generated from a block design that is out-of-date/locked.\"\n\ncreate_bd_design $design_name\n";
        assert_eq!(
            strip_stale_warning(script).unwrap(),
            "set design_name system\n\ncreate_bd_design $design_name\n"
        );
        assert!(strip_stale_warning("create_bd_design system\n").is_none());
    }

    #[test]
    fn test_clean_block_design() {
        let (temp, _root) = root();
        let path = temp.path().join("system.tcl");
        fs::write(
            &path,
            format!("{} \"stale\"\n\nputs done\n", STALE_DESIGN_WARNING),
        )
        .unwrap();
        assert!(clean_block_design(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "puts done\n");
        assert!(!clean_block_design(&path).unwrap());
    }
}
