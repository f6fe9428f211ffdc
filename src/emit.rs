//! # Script Emission
//!
//! Turns an [`AggregatedProject`] into the inputs of the generated Vivado
//! scripts. Everything that depends on the project lives in `inputs.tcl`, a
//! preamble of plain Tcl variables. The driver scripts (`commons.tcl`,
//! `project.tcl`, `export.tcl`, `open.tcl`, `simulate.tcl`) are fixed text that
//! only reads those variables.
//!
//! All lists are sorted with the [`ProjectPath`] order and hold root-relative
//! paths. In Tcl they are prefixed with `$::root`, which `commons.tcl` sets to
//! the project root before sourcing the preamble.
//!
//! `veridian.yml` is written next to the manifest for the Verilog language
//! server, listing the include directories and the directories holding
//! sources.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::aggregate::AggregatedProject;
use crate::config::{FilesetKind, ProjectManifest};
use crate::defaults::tool_dir;
use crate::error::Result;
use crate::path::{exists_in, ProjectPath, ProjectRoot};

/// File name of the generated variable preamble.
pub const INPUTS_SCRIPT: &str = "inputs.tcl";

/// File name of the language server configuration, at the project root.
pub const VERIDIAN_CONFIG: &str = "veridian.yml";

/// A trusted sub-design as handed to the scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubdesignInput {
    pub name: String,
    pub source: String,
}

/// Everything the generated scripts need to know about a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptInputs {
    pub project_name: String,
    pub design_top: String,
    pub simulation_top: String,
    pub vivado_version: String,
    pub part: String,
    pub board: String,
    pub board_long: String,
    pub design: Vec<String>,
    pub simulation: Vec<String>,
    pub includes: Vec<String>,
    pub subdesigns: Vec<SubdesignInput>,
    pub ignores: Vec<String>,
    /// Where block designs without a trusted script are exported to, empty if
    /// not configured.
    pub new_design_path: String,
    /// User IP repository, empty unless it exists.
    pub ip_repo_path: String,
    /// Waveform configuration opened with the simulation: the first
    /// simulation file named `<simulation_top>.wcfg`.
    pub waveform: Option<String>,
    /// `set_property` commands applied after the project is created.
    pub properties: Vec<String>,
}

impl ScriptInputs {
    pub fn new(
        root: &ProjectRoot,
        manifest: &ProjectManifest,
        project: &AggregatedProject,
    ) -> Result<Self> {
        let files = |kind: FilesetKind| strings(project.sorted_files(kind));

        let mut ignores = project
            .ignored
            .patterns
            .iter()
            .map(|pattern| root.project_path(pattern))
            .collect::<Result<Vec<_>>>()?;
        ignores.sort();

        let new_design_path = match &manifest.block_designs.new_design_path {
            Some(path) => root.project_path(path)?.to_string(),
            None => String::new(),
        };
        let ip_repo_path = match &manifest.ips {
            Some(ips) => {
                let path = root.project_path(&ips.user_ip_repo_path)?;
                if exists_in(&path, root) {
                    path.to_string()
                } else {
                    log::info!("user IP repository {} does not exist, not used", path);
                    String::new()
                }
            }
            None => String::new(),
        };

        Ok(Self {
            project_name: manifest.name.clone(),
            design_top: manifest.design_top.clone(),
            simulation_top: manifest.simulation_top.clone(),
            vivado_version: manifest.vivado.version.clone(),
            part: manifest.vivado.part.clone(),
            board: manifest.vivado.board.clone(),
            board_long: manifest.vivado.board_long.clone(),
            design: files(FilesetKind::Design),
            simulation: files(FilesetKind::Simulation),
            includes: strings(project.sorted_includes()),
            subdesigns: project
                .subdesigns
                .iter()
                .map(|s| SubdesignInput {
                    name: s.name.clone(),
                    source: s.source.to_string(),
                })
                .collect(),
            ignores: ignores.iter().map(ProjectPath::to_string).collect(),
            new_design_path,
            ip_repo_path,
            waveform: find_waveform(
                project.sorted_files(FilesetKind::Simulation),
                &manifest.simulation_top,
            ),
            properties: manifest
                .vivado
                .properties
                .iter()
                .map(|p| p.as_tcl())
                .collect(),
        })
    }

    /// Directories holding at least one design or simulation file, in path
    /// order.
    pub fn source_dirs(&self, root: &ProjectRoot) -> Result<Vec<String>> {
        let mut dirs = HashSet::new();
        for file in self.design.iter().chain(&self.simulation) {
            if let Some(parent) = root.project_path(file)?.parent() {
                dirs.insert(parent);
            }
        }
        let mut dirs: Vec<ProjectPath> = dirs.into_iter().collect();
        dirs.sort();
        Ok(dirs.iter().map(ProjectPath::to_string).collect())
    }
}

/// The first `<top>.wcfg` among `files`.
fn find_waveform(files: Vec<&ProjectPath>, top: &str) -> Option<String> {
    files
        .into_iter()
        .find(|f| f.extension() == Some("wcfg") && f.file_stem() == Some(top))
        .map(ProjectPath::to_string)
}

fn strings(paths: Vec<&ProjectPath>) -> Vec<String> {
    paths.into_iter().map(ProjectPath::to_string).collect()
}

/// Render `inputs.tcl`.
pub fn render_inputs(inputs: &ScriptInputs) -> String {
    let waveform = inputs.waveform.clone().unwrap_or_default();
    let mut out = String::new();
    out.push_str("### Generated by vivamir.\n");
    out.push_str("# Do not edit manually.\n");
    out.push_str("#\n");
    out.push_str("# Project inputs, sourced by commons.tcl after `root` is set.\n\n");

    for (name, value) in [
        ("project_name", &inputs.project_name),
        ("design_top", &inputs.design_top),
        ("simulation_top", &inputs.simulation_top),
        ("supported_vivado_version", &inputs.vivado_version),
        ("part", &inputs.part),
        ("board", &inputs.board),
        ("board_long", &inputs.board_long),
        ("new_design_path", &inputs.new_design_path),
        ("ip_repo_path", &inputs.ip_repo_path),
        ("waveform", &waveform),
    ] {
        let _ = writeln!(out, "set {} {}", name, tcl_word(value));
    }
    out.push('\n');

    let block_designs: Vec<String> = inputs
        .subdesigns
        .iter()
        .map(|s| s.source.clone())
        .collect();
    for (name, paths) in [
        ("des_files", &inputs.design),
        ("sim_files", &inputs.simulation),
        ("includes", &inputs.includes),
        ("block_designs", &block_designs),
    ] {
        write_path_list(&mut out, name, paths);
    }

    out.push_str("set ignores [list");
    for pattern in &inputs.ignores {
        let _ = write!(out, " \\\n    {}", tcl_word(pattern));
    }
    out.push_str("\n]\n\n");

    out.push_str("proc vivamir_user_settings {} {\n");
    for property in &inputs.properties {
        let _ = writeln!(out, "    {}", property);
    }
    out.push_str("}\n");
    out
}

fn write_path_list(out: &mut String, name: &str, paths: &[String]) {
    let _ = write!(out, "set {} [list", name);
    for path in paths {
        let _ = write!(out, " \\\n    \"$::root/{}\"", tcl_escape(path));
    }
    out.push_str("\n]\n");
}

/// Quote a value as a single Tcl word.
pub fn tcl_word(value: &str) -> String {
    let plain = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || "{}[]$\"\\;".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("\"{}\"", tcl_escape(value))
    }
}

/// Escape a value for use inside a double-quoted Tcl word.
fn tcl_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Serialize)]
struct VeridianConfig {
    include_dirs: Vec<String>,
    source_dirs: Vec<String>,
}

/// Render `veridian.yml`.
pub fn render_veridian(root: &ProjectRoot, inputs: &ScriptInputs) -> Result<String> {
    let config = VeridianConfig {
        include_dirs: inputs.includes.clone(),
        source_dirs: inputs.source_dirs(root)?,
    };
    Ok(format!(
        "# Generated by vivamir, do not edit manually.\n{}",
        serde_yaml::to_string(&config)?
    ))
}

/// Write `inputs.tcl`, the driver scripts and `veridian.yml`. Returns the
/// written files.
pub fn write_scripts(root: &ProjectRoot, inputs: &ScriptInputs) -> Result<Vec<PathBuf>> {
    let dir = tool_dir(root.path());
    fs::create_dir_all(&dir)?;

    let mut written = Vec::new();
    let mut write = |path: PathBuf, content: &str| -> Result<()> {
        fs::write(&path, content)?;
        log::debug!("wrote {}", path.display());
        written.push(path);
        Ok(())
    };

    write(dir.join(INPUTS_SCRIPT), &render_inputs(inputs))?;
    for (name, content) in DRIVERS {
        write(dir.join(name), content)?;
    }
    write(
        root.path().join(VERIDIAN_CONFIG),
        &render_veridian(root, inputs)?,
    )?;
    Ok(written)
}

/// Path of a driver script below the project root.
pub fn driver_path(root: &Path, name: &str) -> PathBuf {
    tool_dir(root).join(name)
}

pub const COMMONS_SCRIPT: &str = "commons.tcl";
pub const PROJECT_SCRIPT: &str = "project.tcl";
pub const EXPORT_SCRIPT: &str = "export.tcl";
pub const OPEN_SCRIPT: &str = "open.tcl";
pub const SIMULATE_SCRIPT: &str = "simulate.tcl";

const DRIVERS: [(&str, &str); 5] = [
    (COMMONS_SCRIPT, COMMONS_TCL),
    (PROJECT_SCRIPT, PROJECT_TCL),
    (EXPORT_SCRIPT, EXPORT_TCL),
    (OPEN_SCRIPT, OPEN_TCL),
    (SIMULATE_SCRIPT, SIMULATE_TCL),
];

const COMMONS_TCL: &str = r#"### Generated by vivamir.
# Do not edit manually.
#
# Common setup sourced by every other script.

## Project root, the parent of the directory holding this script.
set root [file dirname [file dirname [file normalize [info script]]]]

## Project inputs.
source [file join $::root vivamir inputs.tcl]

## Check that a supported Vivado version is running.
set current_vivado_version [version -short]
if { [string first $current_vivado_version $supported_vivado_version] == -1 } {
    puts "ERROR: \[vivamir\] Vivado $current_vivado_version is not supported, expected $supported_vivado_version"
    return 1
}

## Close the current project.
if {![catch current_project]} {
    close_project
}

## Export every block design of the open project as a Tcl script.
proc vivamir_export_bds {} {
    set trusted {}
    foreach file $::block_designs {
        dict set trusted [file rootname [file tail $file]] $file
    }

    foreach bd [get_files -quiet *.bd] {
        set name [file rootname [file tail $bd]]
        set output ""
        if {[dict exists $trusted $name]} {
            set output [dict get $trusted $name]
        } elseif {$::new_design_path ne ""} {
            set output $::root/$::new_design_path/$name.tcl
        }

        if {$output eq ""} {
            puts "WARNING: \[vivamir\] No destination for block design $name, skipped."
            continue
        }

        set errored [catch {
            open_bd_design $bd
            write_bd_tcl -force $output
            close_bd_design [current_bd_design]
        } emsg]
        if {$errored} {
            puts "ERROR: \[vivamir\] Exporting $name failed: $emsg"
        } else {
            puts "INFO: \[vivamir\] Exported $name to $output"
        }
    }
}
"#;

const PROJECT_TCL: &str = r#"### Generated by vivamir.
# Do not edit manually.
#
# Creates the project.

source [file join [file dirname [file normalize [info script]]] commons.tcl]

## Only HDL sources are added to the project.
set valid_extensions {.v .vh .sv .svh .vhd .vhdl}
proc vivamir_hdl {files} {
    set result {}
    foreach file $files {
        if {[lsearch -exact $::valid_extensions [file extension $file]] != -1} {
            lappend result $file
        }
    }
    return $result
}

### Force create project
create_project $project_name $::root/vivamir/project -part $part -force
set_property board_part $board_long [current_project]
set_property platform.board_id $board [current_project]

### Design files
set des_hdl [vivamir_hdl $des_files]
if {[llength $des_hdl] > 0} {
    import_files -fileset sources_1 -norecurse $des_hdl
}

### Includes
if {[llength $includes] > 0} {
    set_property include_dirs $includes [get_filesets sources_1]
}

### Simulation files
set sim_hdl [vivamir_hdl $sim_files]
if {[llength $sim_hdl] > 0} {
    import_files -fileset sim_1 -norecurse $sim_hdl
}

### User IPs
if {$ip_repo_path ne ""} {
    set_property ip_repo_paths $::root/$ip_repo_path [current_project]
    update_ip_catalog
}

### Block designs
foreach bd $block_designs {
    source -notrace $bd
    make_wrapper -fileset sources_1 -top [get_files ${design_name}.bd]
    add_files -norecurse -fileset sources_1 \
        $::root/vivamir/project/${project_name}.gen/sources_1/bd/${design_name}/hdl/${design_name}_wrapper.v
}

### Top modules
set_property top_lib xil_defaultlib [get_filesets sources_1]
set_property top $design_top [get_filesets sources_1]
set_property top_lib xil_defaultlib [get_filesets sim_1]
set_property top $simulation_top [get_filesets sim_1]

### Waveform
if {$waveform ne ""} {
    set_property -name xsim.view -value "$::root/$waveform" -object [get_filesets sim_1]
}

### User settings
vivamir_user_settings

### Update
update_compile_order -fileset sources_1
update_compile_order -fileset sim_1
"#;

const EXPORT_TCL: &str = r#"### Generated by vivamir.
# Do not edit manually.
#
# Exports block designs. Sources are copied back by `vivamir export`.

source [file join [file dirname [file normalize [info script]]] commons.tcl]

open_project $::root/vivamir/project/$project_name.xpr
vivamir_export_bds
close_project
"#;

const OPEN_TCL: &str = r#"### Generated by vivamir.
# Do not edit manually.
#
# Creates a fresh project and starts the GUI.

source [file join [file dirname [file normalize [info script]]] project.tcl]

## Keep logging to the terminal once the GUI runs.
set pid [exec tail -n0 -f $::root/vivamir/vivado.log &]

## Retry until the GUI comes up.
while 1 {
    set errored [catch start_gui emsg]
    if {!$errored} break

    puts [string trimright $emsg]
    puts "start_gui failed, press enter to retry (or Ctrl+C to quit)."
    gets stdin
}
"#;

const SIMULATE_TCL: &str = r#"### Generated by vivamir.
# Do not edit manually.
#
# Runs the simulation until $finish.

source [file join [file dirname [file normalize [info script]]] project.tcl]

launch_simulation
run all
"#;
