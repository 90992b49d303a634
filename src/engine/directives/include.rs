//! Description-file inclusion.
//!
//! `Include("path")` accepts either a `.mqmod` file or a directory holding a
//! same-named `.mqmod` fragment. The included file is parsed and visited in
//! place under the current context; relative paths resolve against the
//! including file's directory. An explicit stack of in-progress absolute
//! paths rejects self-inclusion and inclusion cycles — repeated sequential
//! includes of the same file from sibling points are legal.

use std::fs;
use std::path::{Path, PathBuf};

use crate::dsl::ast::DirectiveNode;
use crate::dsl::parser;
use crate::engine::context::ExecutionContext;
use crate::engine::exec::ExecError;

const FRAGMENT_EXTENSION: &str = "mqmod";

pub(super) fn include(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    if ctx.order.disable_includes {
        tracing::debug!("includes disabled, skipping {:?}", node.string_arg(0).resolved);
        return Ok(());
    }

    let target = node.string_arg(0).resolved.clone();
    let base = ctx
        .filepath
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let requested = if Path::new(&target).is_absolute() {
        PathBuf::from(&target)
    } else {
        base.join(&target)
    };

    let file = resolve_fragment(&requested)?;
    let canonical = fs::canonicalize(&file).map_err(|source| ExecError::IncludeIo {
        path: file.display().to_string(),
        source,
    })?;

    let current = fs::canonicalize(&ctx.filepath).unwrap_or_else(|_| ctx.filepath.clone());
    if canonical == current {
        return Err(ExecError::SelfInclude {
            file: ctx.filepath.display().to_string(),
        });
    }
    if ctx.include_stack().contains(&canonical) {
        return Err(ExecError::CircularInclude {
            path: canonical.display().to_string(),
            from: ctx.filepath.display().to_string(),
        });
    }

    let content = fs::read_to_string(&canonical).map_err(|source| ExecError::IncludeIo {
        path: canonical.display().to_string(),
        source,
    })?;
    let mut program = parser::parse(canonical.display().to_string(), content).map_err(
        |source| ExecError::IncludeParse {
            path: canonical.display().to_string(),
            source,
        },
    )?;

    tracing::debug!(path = %canonical.display(), "visiting included file");
    ctx.push_include(canonical.clone());
    let previous = std::mem::replace(&mut ctx.filepath, canonical);
    let result = ctx.visit_program(&mut program);
    ctx.filepath = previous;
    ctx.pop_include();
    result
}

/// Resolve a requested include to a concrete `.mqmod` file, applying the
/// directory-with-same-named-file convention.
fn resolve_fragment(requested: &Path) -> Result<PathBuf, ExecError> {
    if requested.is_file() {
        if requested.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
            return Err(ExecError::IncludeNotMqmod {
                path: requested.display().to_string(),
            });
        }
        return Ok(requested.to_path_buf());
    }

    if requested.is_dir() {
        let Some(stem) = requested.file_name().and_then(|n| n.to_str()) else {
            return Err(ExecError::IncludeNotFound {
                path: requested.display().to_string(),
            });
        };
        let candidate = requested.join(format!("{stem}.{FRAGMENT_EXTENSION}"));
        if candidate.is_file() {
            return Ok(candidate);
        }
        return Err(ExecError::IncludeNotFound {
            path: candidate.display().to_string(),
        });
    }

    Err(ExecError::IncludeNotFound {
        path: requested.display().to_string(),
    })
}
