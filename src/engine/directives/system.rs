//! External command directives.
//!
//! `SystemCall(program, errorAction)` and the three-argument form with an
//! argument array run a subprocess and forward its output. The second
//! parameter selects the failure policy: `Raise` aborts the visit, `Continue`
//! swallows the failure — the only place the engine tolerates a failing
//! sub-operation. `SystemExecCall` additionally suffixes the program name
//! for the active platform (`.exe` on Windows).

use crate::dsl::ast::DirectiveNode;
use crate::engine::context::ExecutionContext;
use crate::engine::exec::ExecError;
use crate::engine::types::Platform;
use crate::util::process::ProcessBuilder;

pub(super) fn system_call(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    run(ctx, node, false)
}

pub(super) fn system_exec_call(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    run(ctx, node, true)
}

fn run(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
    platform_suffixed: bool,
) -> Result<(), ExecError> {
    let mut program = node.string_arg(0).resolved.clone();
    let action = node.string_arg(1).resolved.clone();
    let args = if node.params.len() > 2 {
        node.array_arg(2).resolved_values()
    } else {
        Vec::new()
    };

    if action != "Raise" && action != "Continue" {
        return Err(ExecError::InvalidErrorAction {
            value: action,
            at: node.src.to_string(),
        });
    }
    let raise = action == "Raise";

    if platform_suffixed && ctx.order.platform == Platform::Windows {
        program.push_str(".exe");
    }

    tracing::debug!(%program, ?args, "running external command");
    let outcome = ProcessBuilder::new(&program)
        .args(&args)
        .cwd(&ctx.order.base_path)
        .exec();

    match outcome {
        Ok(output) => {
            if !output.stdout.is_empty() {
                print!("{}", String::from_utf8_lossy(&output.stdout));
            }
            if !output.stderr.is_empty() {
                eprint!("{}", String::from_utf8_lossy(&output.stderr));
            }
            if output.status.success() {
                Ok(())
            } else if raise {
                Err(ExecError::SystemCallFailed {
                    program,
                    message: format!("exited with {}", output.status),
                })
            } else {
                tracing::warn!(%program, status = %output.status, "external command failed; continuing");
                Ok(())
            }
        }
        Err(error) => {
            if raise {
                Err(ExecError::SystemCallFailed {
                    program,
                    message: error.to_string(),
                })
            } else {
                tracing::warn!(%program, %error, "external command could not run; continuing");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::build::order::BuildOrder;
    use crate::dsl::parser::parse;
    use crate::engine::context::ExecutionContext;
    use crate::engine::exec::ExecError;

    fn run(source: &str) -> Result<ExecutionContext, ExecError> {
        let mut program = parse("test.mqroot", source).expect("test source must parse");
        let mut ctx = ExecutionContext::new("test.mqroot", BuildOrder::new("."));
        ctx.visit_program(&mut program)?;
        Ok(ctx)
    }

    #[test]
    fn test_invalid_error_action() {
        let err = run(r#"DeclVersion("1.1"); SystemCall("true", "Ignore")"#).unwrap_err();
        assert!(matches!(err, ExecError::InvalidErrorAction { .. }));
    }

    #[test]
    fn test_continue_swallows_missing_program() {
        run(r#"DeclVersion("1.1"); SystemCall("definitely-not-a-real-binary", "Continue")"#)
            .unwrap();
    }

    #[test]
    fn test_raise_propagates_missing_program() {
        let err = run(r#"DeclVersion("1.1"); SystemCall("definitely-not-a-real-binary", "Raise")"#)
            .unwrap_err();
        assert!(matches!(err, ExecError::SystemCallFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_command_with_arguments() {
        run(r#"DeclVersion("1.1"); SystemCall("true", "Raise", ["--version"])"#).unwrap();
    }
}
