//! Filesystem utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Make `path` absolute against `base` and lexically normalize it.
///
/// Unlike canonicalization this never touches the filesystem, so it also
/// works for paths that are about to be created.
pub fn absolute_from(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absolute_from_relative() {
        assert_eq!(
            absolute_from(Path::new("/work/app"), Path::new("src/core")),
            PathBuf::from("/work/app/src/core")
        );
    }

    #[test]
    fn test_absolute_from_absolute_passes_through() {
        assert_eq!(
            absolute_from(Path::new("/work/app"), Path::new("/other")),
            PathBuf::from("/other")
        );
    }

    #[test]
    fn test_absolute_from_normalizes_dots() {
        assert_eq!(
            absolute_from(Path::new("/work/app"), Path::new("../lib/./inc")),
            PathBuf::from("/work/lib/inc")
        );
    }

    #[test]
    fn test_ensure_dir_and_write() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/file.txt");
        write_string(&nested, "content").unwrap();
        assert_eq!(read_to_string(&nested).unwrap(), "content");
    }
}
