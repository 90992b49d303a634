//! Conditional pattern-match directives.
//!
//! In validation mode the condition is not evaluated at all: every body is
//! entered unconditionally so that errors hiding in unmatched branches still
//! surface.

use crate::dsl::ast::DirectiveNode;
use crate::engine::context::ExecutionContext;
use crate::engine::directives::visit_body;
use crate::engine::exec::ExecError;

pub(super) fn if_pattern_match(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    if ctx.order.validation_mode {
        return visit_body(ctx, node);
    }

    let expr = node.string_arg(0).resolved.clone();
    let pattern = node.string_arg(1).resolved.clone();
    if matches(ctx, &expr, &pattern)? {
        visit_body(ctx, node)
    } else {
        Ok(())
    }
}

pub(super) fn if_not_pattern_match(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    if ctx.order.validation_mode {
        return visit_body(ctx, node);
    }

    let expr = node.string_arg(0).resolved.clone();
    let pattern = node.string_arg(1).resolved.clone();
    if !matches(ctx, &expr, &pattern)? {
        visit_body(ctx, node)
    } else {
        Ok(())
    }
}

pub(super) fn if_any_pattern_match(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    if ctx.order.validation_mode {
        return visit_body(ctx, node);
    }

    let expr = node.string_arg(0).resolved.clone();
    let patterns = node.array_arg(1).resolved_values();
    for pattern in &patterns {
        if matches(ctx, &expr, pattern)? {
            return visit_body(ctx, node);
        }
    }
    Ok(())
}

fn matches(ctx: &mut ExecutionContext, text: &str, pattern: &str) -> Result<bool, ExecError> {
    ctx.patterns
        .is_match(text, pattern)
        .map_err(|source| ExecError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}
