//! High-level operations backing the CLI commands.

pub mod build;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

pub use build::{build, BuildOptions, BuildOutcome};
pub use validate::{validate, ValidateError, ValidateOptions, ValidateOutcome};

/// Resolve a CLI input to the description file to load.
///
/// With `directory` set, `<input>` names a directory and the actual file is
/// `<input>/<dirname>.<extension>`.
pub fn description_path(input: &Path, directory: bool, extension: &str) -> Result<PathBuf> {
    let mut filepath = input.to_path_buf();
    if directory {
        if !filepath.is_dir() {
            bail!("no such directory as '{}' exists", filepath.display());
        }
        let Some(name) = filepath.file_name().map(|n| n.to_os_string()) else {
            bail!(
                "couldn't derive a description file name from '{}'",
                filepath.display()
            );
        };
        let mut file_name = name;
        file_name.push(".");
        file_name.push(extension);
        filepath = filepath.join(file_name);
    }

    if !filepath.is_file() {
        bail!("description file '{}' doesn't exist", filepath.display());
    }

    std::fs::canonicalize(&filepath)
        .with_context(|| format!("failed to resolve '{}'", filepath.display()))
}
