//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a project fixture with two libraries and helpers to
//! run the `vivamir` binary inside it.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_two_libraries();
//!     fixture.command().arg("sources").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// Project manifest ignoring one vendor file of `lib_b`.
    ///
    /// `{version}` is replaced with the crate version by [`super::TestFixture::with_project`].
    pub const PROJECT: &str = r#"
version = "{version}"
name = "blinky"
design_top = "blinky_top"
simulation_top = "blinky_tb"
filesets = []
includes = []

[ignore]
list = ["workspace/lib_b/vendor/ip.v"]

[block_designs]
new_design_path = "workspace/lib_a/bd"

[vivado]
version = "2022.2"
part = "xc7a35tcpg236-1"
board = "basys3"
board_long = "digilentinc.com:basys3:part0:1.2"
"#;

    /// Library with design, simulation and include directories.
    pub const LIB_A: &str = r#"
includes = ["include"]

[[filesets]]
kind = "design"
path = "src"

[[filesets]]
kind = "simulation"
path = "sim"

[block_designs]
trusted = ["bd"]
"#;

    /// Library with a vendored, read-only design directory.
    pub const LIB_B: &str = r#"
[[filesets]]
kind = "design"
path = "rtl"

[[filesets]]
kind = "design"
path = "vendor"
read_only = true
"#;

    /// A project manifest written for an older major version.
    pub const OLD_PROJECT: &str = r#"
version = "1.0.0"
name = "legacy"
design_top = "top"
simulation_top = "tb"
filesets = []
includes = []

[ignore]
list = []

[vivado]
version = "2019.1"
part = "xc7a35tcpg236-1"
board = "basys3"
board_long = "digilentinc.com:basys3:part0:1.2"
"#;
}

/// A test fixture holding a temporary project directory.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_project(manifests::PROJECT)
///     .with_file("workspace/lib_a/src/top.v", "module top; endmodule");
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `vivamir.toml`, filling in the running crate version.
    pub fn with_project(self, content: &str) -> Self {
        let content = content.replace("{version}", env!("CARGO_PKG_VERSION"));
        self.with_file("vivamir.toml", &content)
    }

    /// Write `workspace/<name>/vivamir.lib.toml`.
    pub fn with_library(self, name: &str, content: &str) -> Self {
        self.with_file(&format!("workspace/{}/vivamir.lib.toml", name), content)
    }

    /// The standard fixture: `lib_a` with sources, a testbench, an include
    /// directory and a block design, `lib_b` with RTL and vendored IP.
    pub fn with_two_libraries(self) -> Self {
        self.with_project(manifests::PROJECT)
            .with_library("lib_a", manifests::LIB_A)
            .with_file("workspace/lib_a/src/top.v", "module top; endmodule\n")
            .with_file("workspace/lib_a/src/core/alu.v", "module alu; endmodule\n")
            .with_file("workspace/lib_a/sim/top_tb.sv", "module top_tb; endmodule\n")
            .with_file("workspace/lib_a/include/defs.vh", "`define WIDTH 8\n")
            .with_file("workspace/lib_a/bd/system.tcl", "create_bd_design system\n")
            .with_library("lib_b", manifests::LIB_B)
            .with_file("workspace/lib_b/rtl/uart.v", "module uart; endmodule\n")
            .with_file("workspace/lib_b/vendor/ip.v", "module ip; endmodule\n")
            .with_file("workspace/lib_b/vendor/fifo.v", "module fifo; endmodule\n")
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vivamir");
        cmd.current_dir(self.path()).env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_writes_project() {
        let fixture = TestFixture::new().with_two_libraries();
        assert!(fixture.path().join("vivamir.toml").exists());
        assert!(fixture
            .path()
            .join("workspace/lib_b/vivamir.lib.toml")
            .exists());
    }

    #[test]
    fn test_manifests_are_valid_toml() {
        for content in [
            manifests::PROJECT,
            manifests::LIB_A,
            manifests::LIB_B,
            manifests::OLD_PROJECT,
        ] {
            assert!(content.parse::<toml::Table>().is_ok());
        }
    }
}
