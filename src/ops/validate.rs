//! `moonquake validate` - interpret a description file in validation mode.
//!
//! Validation mode enters every conditional branch unconditionally, so
//! errors hiding behind unmatched patterns still surface. Includes can be
//! disabled to validate a single file in isolation.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::build::order::BuildOrder;
use crate::dsl::{ast, parser};
use crate::engine::context::ExecutionContext;
use crate::engine::exec::ExecError;
use crate::ops::description_path;
use crate::util::diagnostic::SyntaxReport;
use crate::util::fs::read_to_string;

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Treat the input as a directory holding `<dir>/<dirname>.mqroot`.
    pub directory: bool,
    /// Turn `Include()` directives into no-ops.
    pub disable_includes: bool,
    /// Also produce an AST dump of the (visited) program.
    pub dump_ast: bool,
}

#[derive(Debug)]
pub struct ValidateOutcome {
    pub filepath: PathBuf,
    pub ast_dump: Option<String>,
}

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("description file is not syntactically valid")]
    Syntax(#[source] Box<SyntaxReport>),

    #[error("description file is not valid")]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub fn validate(input: &Path, options: &ValidateOptions) -> Result<ValidateOutcome, ValidateError> {
    let filepath = description_path(input, options.directory, "mqroot")?;
    let text = read_to_string(&filepath)?;

    let mut program = parser::parse(filepath.display().to_string(), text.clone())
        .map_err(|e| {
            ValidateError::Syntax(Box::new(SyntaxReport::from_parse_error(
                &e,
                &filepath.display().to_string(),
                &text,
            )))
        })?;

    let base = filepath
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let order = BuildOrder::new(base).for_validation(options.disable_includes);
    let mut ctx = ExecutionContext::new(&filepath, order);
    ctx.visit_program(&mut program)?;

    Ok(ValidateOutcome {
        filepath,
        ast_dump: options.dump_ast.then(|| ast::dump(&program)),
    })
}

impl ValidateError {
    /// The syntax report, when this failure is syntactic.
    pub fn syntax_report(self) -> Option<SyntaxReport> {
        match self {
            ValidateError::Syntax(report) => Some(*report),
            _ => None,
        }
    }
}
