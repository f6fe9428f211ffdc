//! # Init Command Implementation
//!
//! Creates a new vivamir project in a directory:
//!
//! - `vivamir.toml`, with the project named after the directory by default,
//! - `vivamir.ignore` and a `.gitignore` for the generated Vivado project,
//! - a first library in `workspace/<name>/` with `src/` and `sim/` filesets.
//!
//! Values come from flags or, with `--interactive`, from prompts that use the
//! flags as defaults. The command refuses to run inside an existing project.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use vivamir::config;
use vivamir::defaults::{
    GITIGNORE_TEMPLATE, IGNORE_FILE, IGNORE_TEMPLATE, LIBRARY_MANIFEST, LIBRARY_TEMPLATE,
    PROJECT_MANIFEST, PROJECT_TEMPLATE, WORKSPACE_DIR,
};
use vivamir::output::{emoji, OutputConfig};
use vivamir::path::ProjectRoot;
use vivamir::suggestions;
use vivamir::version;

/// Vivado release assumed when none is given.
const DEFAULT_VIVADO_VERSION: &str = "2022.2";

/// Directories created in the first library.
const LIBRARY_DIRS: [&str; 3] = ["src", "sim", "block_designs"];

/// Create a new project with a first library
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to create the project in
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Prompt for every value, using the flags as defaults
    #[arg(short, long)]
    pub interactive: bool,

    /// Project and first library name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Vivado release, e.g. 2022.2
    #[arg(long, value_name = "VERSION")]
    pub vivado_version: Option<String>,

    /// Vivado part, e.g. xck26-sfvc784-2LV-c
    #[arg(long)]
    pub part: Option<String>,

    /// Vivado board part
    #[arg(long)]
    pub board: Option<String>,

    /// Full Vivado board part name
    #[arg(long)]
    pub board_long: Option<String>,
}

/// Values written into the new manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProjectValues {
    name: String,
    vivado_version: String,
    part: String,
    board: String,
    board_long: String,
}

/// Execute the `init` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: InitArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    fs::create_dir_all(&args.dir)?;
    if let Ok(existing) = ProjectRoot::discover(&args.dir) {
        return Err(anyhow::anyhow!(
            "A vivamir project already exists at {}\n\n\
             hint: Run 'vivamir validate' to check the existing project",
            existing.path().display()
        ));
    }
    let root = ProjectRoot::new(&args.dir).map_err(suggestions::from_error)?;

    println!(
        "{} Initializing vivamir project in {}",
        emoji(&out, "🎯", "[INIT]"),
        root.path().display()
    );

    let values = if args.interactive {
        prompt_values(&args, root.path())?
    } else {
        values_from_flags(&args, root.path())?
    };

    write_project(root.path(), &values)?;
    // Fail now rather than on the first generate if a value broke the manifest
    config::load_project(&root).map_err(suggestions::from_error)?;

    println!(
        "{} Created {}, {} and library '{}'",
        emoji(&out, "✅", "[OK]"),
        PROJECT_MANIFEST,
        IGNORE_FILE,
        values.name
    );
    println!(
        "{} Add sources to {}/{}/src and run `vivamir generate`",
        emoji(&out, "💡", "[HINT]"),
        WORKSPACE_DIR,
        values.name
    );
    Ok(())
}

fn default_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().replace(' ', "_"))
        .unwrap_or_else(|| "project".to_string())
}

fn values_from_flags(args: &InitArgs, dir: &Path) -> Result<ProjectValues> {
    let name = args.name.clone().unwrap_or_else(|| default_name(dir));
    validate_name(&name).map_err(|e| anyhow::anyhow!(e))?;
    let vivado_version = args
        .vivado_version
        .clone()
        .unwrap_or_else(|| DEFAULT_VIVADO_VERSION.to_string());
    validate_vivado_version(&vivado_version).map_err(|e| anyhow::anyhow!(e))?;

    let required = |value: &Option<String>, flag: &str| {
        value.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "Missing value for --{flag}\n\n\
                 hint: Pass --{flag} <VALUE> or run 'vivamir init --interactive'"
            )
        })
    };

    Ok(ProjectValues {
        name,
        vivado_version,
        part: required(&args.part, "part")?,
        board: required(&args.board, "board")?,
        board_long: required(&args.board_long, "board-long")?,
    })
}

fn prompt_values(args: &InitArgs, dir: &Path) -> Result<ProjectValues> {
    let theme = ColorfulTheme::default();

    let name: String = Input::with_theme(&theme)
        .with_prompt("Base library name")
        .default(args.name.clone().unwrap_or_else(|| default_name(dir)))
        .validate_with(|input: &String| validate_name(input))
        .interact_text()?;

    let vivado_version: String = Input::with_theme(&theme)
        .with_prompt("Vivado version")
        .default(
            args.vivado_version
                .clone()
                .unwrap_or_else(|| DEFAULT_VIVADO_VERSION.to_string()),
        )
        .validate_with(|input: &String| validate_vivado_version(input))
        .interact_text()?;

    let ask = |prompt: &str, default: &Option<String>| -> Result<String> {
        let mut input = Input::<String>::with_theme(&theme).with_prompt(prompt);
        if let Some(default) = default {
            input = input.default(default.clone());
        }
        Ok(input.interact_text()?)
    };

    Ok(ProjectValues {
        name,
        vivado_version,
        part: ask("Vivado part", &args.part)?,
        board: ask("Vivado board", &args.board)?,
        board_long: ask("Vivado board long", &args.board_long)?,
    })
}

fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        Err("Project name cannot be empty".to_string())
    } else if name.contains(char::is_whitespace) {
        Err("Project name cannot contain spaces".to_string())
    } else if name.contains(['/', '\\']) {
        Err("Project name cannot contain path separators".to_string())
    } else {
        Ok(())
    }
}

fn validate_vivado_version(version: &str) -> std::result::Result<(), String> {
    let pattern = Regex::new(r"^\d+\.\d+$").map_err(|e| e.to_string())?;
    if pattern.is_match(version) {
        Ok(())
    } else {
        Err(format!(
            "Vivado version '{}' must look like YYYY.N, e.g. {}",
            version, DEFAULT_VIVADO_VERSION
        ))
    }
}

fn render_project(values: &ProjectValues) -> String {
    PROJECT_TEMPLATE
        .replace("{version}", version::VERSION)
        .replace("{vivado_version}", &values.vivado_version)
        .replace("{part}", &values.part)
        .replace("{board_long}", &values.board_long)
        .replace("{board}", &values.board)
        .replace("{library}", &values.name)
        .replace("{name}", &values.name)
}

fn write_project(dir: &Path, values: &ProjectValues) -> Result<()> {
    fs::write(dir.join(PROJECT_MANIFEST), render_project(values))?;
    fs::write(dir.join(IGNORE_FILE), IGNORE_TEMPLATE)?;

    let gitignore = dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, GITIGNORE_TEMPLATE)?;
    }

    let library = dir.join(WORKSPACE_DIR).join(&values.name);
    for sub in LIBRARY_DIRS {
        fs::create_dir_all(library.join(sub))?;
    }
    fs::write(library.join(LIBRARY_MANIFEST), LIBRARY_TEMPLATE)?;
    Ok(())
}
