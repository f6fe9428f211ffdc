//! Default values and fixed layout conventions for vivamir projects.
//!
//! The file names and directory layout here are shared between the manifest
//! loader, the script generator and the export reconciler. The Tcl drivers
//! rely on the same layout, so none of these are configurable per project.

use std::path::{Path, PathBuf};

/// Project manifest file name, at the project root.
pub const PROJECT_MANIFEST: &str = "vivamir.toml";

/// Library manifest file name, one per immediate subdirectory of the workspace.
pub const LIBRARY_MANIFEST: &str = "vivamir.lib.toml";

/// Default ignore file written by `init`.
pub const IGNORE_FILE: &str = "vivamir.ignore";

/// Default libraries directory, relative to the project root.
pub const WORKSPACE_DIR: &str = "workspace";

/// Directory (relative to the project root) holding generated scripts and the
/// tool's own project.
pub const TOOL_DIR: &str = "vivamir";

/// Tool project directory, relative to [`TOOL_DIR`].
pub const TOOL_PROJECT_DIR: &str = "project";

/// Suffix every trusted sub-design must carry.
pub const SUBDESIGN_SUFFIX: &str = "tcl";

/// Marker that starts a comment line in an ignore file.
pub const IGNORE_COMMENT: char = '#';

/// Environment variable naming the Vivado executable.
pub const VIVADO_ENV: &str = "VIVAMIR_VIVADO";

/// Returns the generated-scripts directory for a project root.
pub fn tool_dir(root: &Path) -> PathBuf {
    root.join(TOOL_DIR)
}

/// Project manifest template used by `init`.
///
/// Placeholders are `{name}`, `{version}`, `{vivado_version}`, `{part}`,
/// `{board}`, `{board_long}` and `{library}`.
pub const PROJECT_TEMPLATE: &str = r#"# Vivamir project configuration.
version = "{version}"
name = "{name}"
design_top = "{name}_top"
simulation_top = "{name}_tb"

filesets = []
includes = []

[ignore]
include = "vivamir.ignore"

[block_designs]
new_design_path = "workspace/{library}/block_designs"
trusted = []

[ips]
user_ip_repo_path = "workspace/{library}/ips"

[vivado]
version = "{vivado_version}"
part = "{part}"
board = "{board}"
board_long = "{board_long}"
properties = []
"#;

/// Library manifest template used by `init`.
pub const LIBRARY_TEMPLATE: &str = r#"# Vivamir library configuration.
includes = []

[[filesets]]
kind = "design"
path = "src"

[[filesets]]
kind = "simulation"
path = "sim"

[block_designs]
trusted = []
"#;

/// Ignore file written by `init`.
pub const IGNORE_TEMPLATE: &str = r#"# Files matching these patterns (relative to the project root) are
# left out of every fileset.
# workspace/*/src/scratch_*.v
"#;

/// `.gitignore` written by `init`.
pub const GITIGNORE_TEMPLATE: &str = r#"# Vivado project and logs
/vivamir/project/
/vivamir/*.log
/vivamir/*.jou
/vivamir/.Xil/
"#;
