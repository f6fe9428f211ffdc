//! # Root Command Implementation
//!
//! Prints the absolute path of the enclosing project, for use in shell
//! scripts (`cd "$(vivamir root)"`).

use anyhow::Result;
use clap::Args;

/// Print the project root directory
#[derive(Args, Debug)]
pub struct RootArgs {}

/// Execute the `root` command.
pub fn execute(_args: RootArgs) -> Result<()> {
    let root = super::find_root()?;
    println!("{}", root.path().display());
    Ok(())
}
