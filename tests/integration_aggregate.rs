//! Integration tests for library aggregation.
//!
//! These tests build a two-library project on disk and drive the public
//! library API the same way the CLI does.

#[allow(dead_code)]
mod common;
use common::prelude::*;

use vivamir::aggregate::{aggregate, aggregate_with, discover_libraries};
use vivamir::config::{self, FilesetKind};
use vivamir::emit::{render_inputs, write_scripts, ScriptInputs, INPUTS_SCRIPT};
use vivamir::error::Error;
use vivamir::path::ProjectRoot;

fn strings<'a>(paths: impl IntoIterator<Item = &'a vivamir::path::ProjectPath>) -> Vec<String> {
    paths.into_iter().map(ToString::to_string).collect()
}

#[test]
fn test_aggregate_two_libraries() {
    let fixture = TestFixture::new().with_two_libraries();
    let root = ProjectRoot::new(fixture.path()).unwrap();

    let project = aggregate(&root).unwrap();

    assert_eq!(
        strings(project.sorted_files(FilesetKind::Design)),
        vec![
            "workspace/lib_a/src/top.v",
            "workspace/lib_a/src/core/alu.v",
            "workspace/lib_b/rtl/uart.v",
            "workspace/lib_b/vendor/fifo.v",
        ]
    );
    assert_eq!(
        strings(project.sorted_files(FilesetKind::Simulation)),
        vec!["workspace/lib_a/sim/top_tb.sv"]
    );
    assert_eq!(
        strings(project.sorted_includes()),
        vec!["workspace/lib_a/include"]
    );

    assert_eq!(project.subdesigns.len(), 1);
    assert_eq!(project.subdesigns[0].name, "system");
    assert_eq!(
        project.subdesigns[0].source.as_str(),
        "workspace/lib_a/bd/system.tcl"
    );

    let read_only = strings(&project.read_only);
    assert_eq!(read_only, vec!["workspace/lib_b/vendor/fifo.v"]);

    assert_eq!(
        project.destinations[&FilesetKind::Design].as_str(),
        "workspace/lib_a/src"
    );
    assert_eq!(
        project.destinations[&FilesetKind::Simulation].as_str(),
        "workspace/lib_a/sim"
    );
}

#[test]
fn test_ignored_file_is_removed_everywhere() {
    let fixture = TestFixture::new().with_two_libraries();
    let root = ProjectRoot::new(fixture.path()).unwrap();

    let project = aggregate(&root).unwrap();

    let ip = root.project_path("workspace/lib_b/vendor/ip.v").unwrap();
    assert!(project.ignored.paths.contains(&ip));
    assert!(!project.files(FilesetKind::Design).any(|p| *p == ip));
    assert!(!project.read_only.contains(&ip));
}

#[test]
fn test_aggregation_is_deterministic() {
    let fixture = TestFixture::new().with_two_libraries();
    let root = ProjectRoot::new(fixture.path()).unwrap();

    let first = aggregate(&root).unwrap();
    let second = aggregate(&root).unwrap();
    assert_eq!(first, second);

    let manifest = config::load_project(&root).unwrap();
    let a = render_inputs(&ScriptInputs::new(&root, &manifest, &first).unwrap());
    let b = render_inputs(&ScriptInputs::new(&root, &manifest, &second).unwrap());
    assert_eq!(a, b);
}

#[test]
fn test_library_order_does_not_matter() {
    let fixture = TestFixture::new().with_two_libraries();
    let root = ProjectRoot::new(fixture.path()).unwrap();

    let mut manifest = config::load_project(&root).unwrap();
    let mut libraries = discover_libraries(&root, &manifest.workspace).unwrap();
    let forward = aggregate_with(&root, &mut manifest, &mut libraries).unwrap();

    let mut manifest = config::load_project(&root).unwrap();
    let mut libraries = discover_libraries(&root, &manifest.workspace).unwrap();
    libraries.reverse();
    let reversed = aggregate_with(&root, &mut manifest, &mut libraries).unwrap();

    assert_eq!(forward, reversed);
}

#[cfg(unix)]
#[test]
fn test_exec_reference_runs_once() {
    let fixture = TestFixture::new()
        .with_project(manifests::PROJECT)
        .with_library(
            "lib_a",
            r#"
[[filesets]]
kind = "design"
exec = "echo run >> count.txt && echo src"
"#,
        )
        .with_file("workspace/lib_a/src/top.v", "module top; endmodule\n");
    let root = ProjectRoot::new(fixture.path()).unwrap();

    let mut manifest = config::load_project(&root).unwrap();
    let mut libraries = discover_libraries(&root, &manifest.workspace).unwrap();
    let first = aggregate_with(&root, &mut manifest, &mut libraries).unwrap();
    let second = aggregate_with(&root, &mut manifest, &mut libraries).unwrap();

    assert_eq!(first, second);
    let count = std::fs::read_to_string(fixture.path().join("workspace/lib_a/count.txt")).unwrap();
    assert_eq!(count.lines().count(), 1);
}

#[test]
fn test_missing_fileset_directory_fails() {
    let fixture = TestFixture::new()
        .with_project(manifests::PROJECT)
        .with_library("lib_a", manifests::LIB_A);
    let root = ProjectRoot::new(fixture.path()).unwrap();

    let err = aggregate(&root).unwrap_err();
    assert!(matches!(err, Error::MissingPath { .. }), "{err}");
}

#[test]
fn test_path_outside_project_fails() {
    let fixture = TestFixture::new().with_project(manifests::PROJECT).with_library(
        "lib_a",
        r#"
includes = ["../../.."]
"#,
    );
    let root = ProjectRoot::new(fixture.path()).unwrap();

    let err = aggregate(&root).unwrap_err();
    assert!(matches!(err, Error::PathOutsideProject { .. }), "{err}");
}

#[test]
fn test_incompatible_manifest_version() {
    let fixture = TestFixture::new().with_file("vivamir.toml", manifests::OLD_PROJECT);
    let root = ProjectRoot::new(fixture.path()).unwrap();

    let err = aggregate(&root).unwrap_err();
    assert!(matches!(err, Error::IncompatibleVersion { .. }), "{err}");
}

#[test]
fn test_write_scripts_lists_sources() {
    let fixture = TestFixture::new().with_two_libraries();
    let root = ProjectRoot::new(fixture.path()).unwrap();
    let manifest = config::load_project(&root).unwrap();
    let project = aggregate(&root).unwrap();

    let inputs = ScriptInputs::new(&root, &manifest, &project).unwrap();
    assert!(!inputs.design.iter().any(|f| f.ends_with("ip.v")));
    assert_eq!(inputs.ignores, vec!["workspace/lib_b/vendor/ip.v"]);
    write_scripts(&root, &inputs).unwrap();

    fixture
        .child("vivamir")
        .child(INPUTS_SCRIPT)
        .assert(predicate::str::contains("workspace/lib_b/rtl/uart.v"));
    fixture
        .child("veridian.yml")
        .assert(predicate::str::contains("workspace/lib_a/include"));
}
