//! Module-scope directives: field protection.

use crate::dsl::ast::DirectiveNode;
use crate::engine::context::ExecutionContext;
use crate::engine::exec::ExecError;

pub(super) fn protect_field(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    let field = node.string_arg(0).resolved.clone();
    let at = node.src.to_string();
    let scope = ctx.scope();

    let Some(construct) = ctx.current_construct_mut() else {
        return Err(ExecError::NoConstructInScope { field, scope, at });
    };
    construct
        .protect(&field)
        .map_err(|source| ExecError::Field { at, source })
}

pub(super) fn protect_all_fields(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    let at = node.src.to_string();
    let scope = ctx.scope();

    let Some(construct) = ctx.current_construct_mut() else {
        return Err(ExecError::NoConstructInScope {
            field: "*".to_string(),
            scope,
            at,
        });
    };
    construct.protect_all();
    Ok(())
}
