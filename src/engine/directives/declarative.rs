//! Declarative directives: version, root, schema, and module declaration.

use crate::dsl::ast::{DirectiveNode, Stmt};
use crate::dsl::version::LanguageVersion;
use crate::engine::construct::{Module, Root, Schema};
use crate::engine::context::{ExecutionContext, ExecutionFrame, FrameConstruct, Scope};
use crate::engine::directives::{names, visit_body};
use crate::engine::exec::ExecError;

pub(super) fn decl_version(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    if let Some(previous) = ctx.declared_version {
        return Err(ExecError::VersionAlreadyDeclared { previous });
    }

    let text = &node.string_arg(0).resolved;
    let version: LanguageVersion = text
        .parse()
        .map_err(|_| ExecError::VersionUnparsable {
            value: text.clone(),
        })?;

    if version.is_more_recent_than(LanguageVersion::LATEST)
        || version < LanguageVersion::INITIAL
    {
        return Err(ExecError::VersionUnsupported {
            declared: version,
            latest: LanguageVersion::LATEST,
        });
    }

    tracing::debug!("language version declared as {version}");
    ctx.declared_version = Some(version);
    Ok(())
}

pub(super) fn decl_root(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    let name = node.string_arg(0).resolved.clone();
    if ctx.roots.contains_key(&name) {
        return Err(ExecError::DuplicateRoot { name });
    }

    let root = Root::new(&name, ctx.filepath.clone());
    ctx.push_frame(Scope::Root, FrameConstruct::Root(root));
    let result = visit_body(ctx, node);
    let frame = ctx.pop_frame();
    result?;

    let root = take_root(frame);
    tracing::debug!(root = %name, "declared root");
    ctx.roots.insert(name, root);
    Ok(())
}

pub(super) fn decl_schema(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    let name = node.string_arg(0).resolved.clone();
    if ctx.schemas.contains_key(&name) {
        return Err(ExecError::DuplicateSchema { name });
    }

    // The body does not execute at declaration time; it is scanned here for
    // the single permitted Defer block and executed per instantiating module.
    let body = node.body.clone().unwrap_or_default();
    let mut deferred = None;
    for stmt in &body {
        let Stmt::Directive(directive) = stmt else {
            continue;
        };
        if directive.name != names::DEFER {
            continue;
        }
        if deferred.is_some() {
            return Err(ExecError::MultipleDeferBlocks { schema: name });
        }
        let Some(defer_body) = &directive.body else {
            return Err(ExecError::DeferWithoutBody { schema: name });
        };
        deferred = Some(defer_body.clone());
    }

    tracing::debug!(schema = %name, has_deferred = deferred.is_some(), "declared schema");
    ctx.schemas.insert(
        name.clone(),
        Schema {
            name,
            filepath: ctx.filepath.clone(),
            body,
            deferred,
        },
    );
    Ok(())
}

pub(super) fn decl_module(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    instantiate(ctx, node, None)
}

pub(super) fn decl_module_templated(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    let schema = node.string_arg(1).resolved.clone();
    instantiate(ctx, node, Some(schema))
}

/// Instantiate a module, applying the fixed three-phase evaluation order:
/// schema body (template defaults), then the module's own body (user
/// overrides), then the schema's deferred body (conditional fallbacks that
/// respect first-writer-wins and protection).
fn instantiate(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
    template: Option<String>,
) -> Result<(), ExecError> {
    let name = node.string_arg(0).resolved.clone();
    if ctx.modules.contains_key(&name) {
        return Err(ExecError::DuplicateModule { name });
    }

    // A module must already be claimed by some declared root.
    let claimed = ctx
        .roots
        .values()
        .any(|root| root.modules().map(|m| m.contains(&name)).unwrap_or(false));
    if !claimed {
        return Err(ExecError::ModuleNotClaimed { name });
    }

    let mut module = Module::new(&name, ctx.filepath.clone());
    module.template = template.clone();

    let schema_parts = match &template {
        Some(schema_name) => {
            let schema =
                ctx.schemas
                    .get(schema_name)
                    .ok_or_else(|| ExecError::UnknownSchema {
                        schema: schema_name.clone(),
                        module: name.clone(),
                    })?;
            // Fresh clones per instantiation: a schema body is reused across
            // modules and must not carry resolved state between them.
            Some((schema.body.clone(), schema.deferred.clone()))
        }
        None => None,
    };

    if let Some((mut schema_body, _)) = schema_parts.clone() {
        ctx.push_frame(Scope::Schema, FrameConstruct::Module(module));
        let result = ctx.visit_program(&mut schema_body);
        let frame = ctx.pop_frame();
        result?;
        module = take_module(frame);
    }

    ctx.push_frame(Scope::Module, FrameConstruct::Module(module));
    let result = visit_body(ctx, node);
    let frame = ctx.pop_frame();
    result?;
    module = take_module(frame);

    if let Some((_, Some(mut deferred))) = schema_parts {
        ctx.push_frame(Scope::Deferred, FrameConstruct::Module(module));
        let result = ctx.visit_program(&mut deferred);
        let frame = ctx.pop_frame();
        result?;
        module = take_module(frame);
    }

    tracing::debug!(module = %name, template = ?template, "declared module");
    ctx.modules.insert(name, module);
    Ok(())
}

pub(super) fn defer(
    _ctx: &mut ExecutionContext,
    _node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    // DeclSchema takes the body at declaration; the node itself is inert.
    Ok(())
}

fn take_root(frame: ExecutionFrame) -> Root {
    match frame.construct {
        FrameConstruct::Root(root) => root,
        _ => unreachable!("root declaration frame must hold a root construct"),
    }
}

fn take_module(frame: ExecutionFrame) -> Module {
    match frame.construct {
        FrameConstruct::Module(module) => module,
        _ => unreachable!("module instantiation frame must hold a module construct"),
    }
}
