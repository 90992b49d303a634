//! The AST execution engine.
//!
//! Interprets a parsed program against an [`ExecutionContext`], dispatching
//! directives through the registry and applying field statements to the
//! construct bound to the current frame. Every violation is a structured
//! error and aborts the visit; there is no partial recovery.

use thiserror::Error;

use crate::dsl::ast::{DirectiveNode, Expr, ExprShape, FieldWrite, Stmt, StringNode};
use crate::dsl::parser::ParseError;
use crate::dsl::version::LanguageVersion;
use crate::engine::construct::module_fields;
use crate::engine::context::{ExecutionContext, Scope};
use crate::engine::directives::{self, registry};
use crate::engine::field::{FieldError, FieldValueRef};

/// A semantic, scope, or resolution error raised during interpretation.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error(
        "the first statement of '{file}' must declare the language version \
         with {directive}(...)",
        directive = directives::names::DECLARE_VERSION
    )]
    VersionMustBeFirst { file: String },

    #[error("language version was already declared as '{previous}'")]
    VersionAlreadyDeclared { previous: LanguageVersion },

    #[error("language version string '{value}' couldn't be parsed")]
    VersionUnparsable { value: String },

    #[error(
        "language version '{declared}' is not supported by this engine \
         (latest supported: {latest})"
    )]
    VersionUnsupported {
        declared: LanguageVersion,
        latest: LanguageVersion,
    },

    #[error("{at}: unknown directive '{name}'")]
    UnknownDirective { name: String, at: String },

    #[error(
        "{at}: directive '{directive}' is not valid in {scope} scope; \
         valid scopes: {valid}"
    )]
    InvalidScope {
        directive: String,
        scope: Scope,
        valid: String,
        at: String,
    },

    #[error("{at}: directive '{directive}' requires a body")]
    MissingBody { directive: String, at: String },

    #[error("{at}: directive '{directive}' does not take a body")]
    UnexpectedBody { directive: String, at: String },

    #[error(
        "{at}: only conditional directives may appear in a deferred block, \
         and '{directive}' is not one"
    )]
    NotConditionalInDeferred { directive: String, at: String },

    #[error("{at}: no overload of '{directive}' accepts arguments of shape ({shape})")]
    NoMatchingOverload {
        directive: String,
        shape: String,
        at: String,
    },

    #[error("{at}: field '{field}' cannot be written here; {scope} scope has no construct")]
    NoConstructInScope {
        field: String,
        scope: Scope,
        at: String,
    },

    #[error(
        "{at}: a deferred block only permits dubious assignment (?=) and \
         conditional directives; '{field}' uses an ordinary field statement"
    )]
    StatementNotAllowedInDeferred { field: String, at: String },

    #[error("{at}: dubious assignment to '{field}' is only legal inside a deferred block")]
    DubiousOutsideDeferred { field: String, at: String },

    #[error("{at}: {source}")]
    Field {
        at: String,
        #[source]
        source: FieldError,
    },

    #[error("a root named '{name}' was already declared")]
    DuplicateRoot { name: String },

    #[error("a module named '{name}' was already declared")]
    DuplicateModule { name: String },

    #[error("a schema named '{name}' was already declared")]
    DuplicateSchema { name: String },

    #[error("module '{module}' references schema '{schema}', but no such schema was declared")]
    UnknownSchema { schema: String, module: String },

    #[error(
        "module '{name}' is not listed in any declared root's Modules field; \
         declare the owning root (and list the module) before the module itself"
    )]
    ModuleNotClaimed { name: String },

    #[error("schema '{schema}' contains more than one Defer() block; only one is permitted")]
    MultipleDeferBlocks { schema: String },

    #[error("schema '{schema}' has a Defer() directive with no body")]
    DeferWithoutBody { schema: String },

    #[error("included file '{path}' must have the '.mqmod' extension")]
    IncludeNotMqmod { path: String },

    #[error("nothing to include at '{path}': no such file or directory-with-fragment")]
    IncludeNotFound { path: String },

    #[error("description file '{file}' is including itself")]
    SelfInclude { file: String },

    #[error("circular inclusion of '{path}' detected; last include attempted from '{from}'")]
    CircularInclude { path: String, from: String },

    #[error("failed to read included file '{path}'")]
    IncludeIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse included file '{path}'")]
    IncludeParse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("pattern '{pattern}' could not be compiled")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(
        "{at}: error action '{value}' is invalid; only 'Raise' and 'Continue' are allowed"
    )]
    InvalidErrorAction { value: String, at: String },

    #[error("external command '{program}' failed: {message}")]
    SystemCallFailed { program: String, message: String },
}

enum WriteOp {
    Assign,
    Append,
    Erase,
    Dubious,
}

impl ExecutionContext {
    /// Visit a whole program (a file body or a directive body).
    pub fn visit_program(&mut self, program: &mut [Stmt]) -> Result<(), ExecError> {
        for stmt in program {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) -> Result<(), ExecError> {
        if matches!(stmt, Stmt::Noop) {
            return Ok(());
        }

        // Nothing executes before the language version declaration.
        if self.declared_version.is_none() {
            let declares_version = matches!(
                stmt,
                Stmt::Directive(d) if d.name == directives::names::DECLARE_VERSION
            );
            if !declares_version {
                return Err(ExecError::VersionMustBeFirst {
                    file: self.filepath.display().to_string(),
                });
            }
        }

        match stmt {
            Stmt::Noop => Ok(()),
            Stmt::Directive(node) => self.visit_directive(node),
            Stmt::Assign(write) => self.apply_write(write, WriteOp::Assign),
            Stmt::Append(write) => self.apply_write(write, WriteOp::Append),
            Stmt::Erase(write) => self.apply_write(write, WriteOp::Erase),
            Stmt::DubiousAssign(write) => self.apply_write(write, WriteOp::Dubious),
            Stmt::Unassign { field, src } => {
                let field = field.clone();
                let at = src.to_string();
                let scope = self.scope();
                if scope == Scope::Deferred {
                    return Err(ExecError::StatementNotAllowedInDeferred { field, at });
                }
                let Some(construct) = self.current_construct_mut() else {
                    return Err(ExecError::NoConstructInScope { field, scope, at });
                };
                construct
                    .unassign(&field)
                    .map_err(|source| ExecError::Field { at, source })
            }
        }
    }

    fn visit_directive(&mut self, node: &mut DirectiveNode) -> Result<(), ExecError> {
        let at = node.src.to_string();

        // Resolve every parameter expression first, left to right, recording
        // the argument-shape key for overload dispatch.
        let mut shape = Vec::with_capacity(node.params.len());
        for param in &mut node.params {
            self.resolve_expr(param);
            shape.push(param.shape());
        }

        let directive = registry::find(&node.name).ok_or_else(|| ExecError::UnknownDirective {
            name: node.name.clone(),
            at: at.clone(),
        })?;

        let scope = self.scope();
        if !directive.valid_scopes.contains(&scope) {
            return Err(ExecError::InvalidScope {
                directive: node.name.clone(),
                scope,
                valid: directive.valid_scopes_display(),
                at,
            });
        }

        match (directive.is_bodily(), node.body.is_some()) {
            (true, false) => {
                return Err(ExecError::MissingBody {
                    directive: node.name.clone(),
                    at,
                });
            }
            (false, true) => {
                return Err(ExecError::UnexpectedBody {
                    directive: node.name.clone(),
                    at,
                });
            }
            _ => {}
        }

        if scope == Scope::Deferred && !directive.is_conditional() {
            return Err(ExecError::NotConditionalInDeferred {
                directive: node.name.clone(),
                at,
            });
        }

        let handler =
            directive
                .overload(&shape)
                .ok_or_else(|| ExecError::NoMatchingOverload {
                    directive: node.name.clone(),
                    shape: display_shape(&shape),
                    at,
                })?;

        handler(self, node)
    }

    fn apply_write(&mut self, write: &mut FieldWrite, op: WriteOp) -> Result<(), ExecError> {
        self.resolve_expr(&mut write.value);

        let at = write.src.to_string();
        let scope = self.scope();
        match (&op, scope) {
            (WriteOp::Dubious, Scope::Deferred) => {}
            (WriteOp::Dubious, _) => {
                return Err(ExecError::DubiousOutsideDeferred {
                    field: write.field.clone(),
                    at,
                });
            }
            (_, Scope::Deferred) => {
                return Err(ExecError::StatementNotAllowedInDeferred {
                    field: write.field.clone(),
                    at,
                });
            }
            _ => {}
        }

        let resolved_items;
        let value = match &write.value {
            Expr::String(s) => FieldValueRef::String(&s.resolved),
            Expr::Array(a) => {
                resolved_items = a.resolved_values();
                FieldValueRef::Array(&resolved_items)
            }
        };

        let Some(construct) = self.current_construct_mut() else {
            return Err(ExecError::NoConstructInScope {
                field: write.field.clone(),
                scope,
                at,
            });
        };

        let result = match op {
            WriteOp::Assign => construct.assign(&write.field, value),
            WriteOp::Append => construct.append(&write.field, value),
            WriteOp::Erase => construct.erase(&write.field, value),
            WriteOp::Dubious => match construct.dubious_assign(&write.field, value) {
                // A template fallback that loses to an explicit value or a
                // protection is the intended outcome, not a failure.
                Err(FieldError::FieldProtected { field }) => {
                    tracing::debug!("dubious assignment to protected field '{field}' skipped");
                    Ok(())
                }
                Err(FieldError::FieldNotUnset { field }) => {
                    tracing::debug!("dubious assignment to assigned field '{field}' skipped");
                    Ok(())
                }
                other => other,
            },
        };

        result.map_err(|source| ExecError::Field { at, source })
    }

    /// Resolve an expression's string nodes in place (lazily, once).
    pub fn resolve_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::String(node) => self.resolve_string(node),
            Expr::Array(array) => {
                for item in &mut array.items {
                    self.resolve_string(item);
                }
            }
        }
    }

    fn resolve_string(&mut self, node: &mut StringNode) {
        if !node.resolved.is_empty() {
            return;
        }
        node.resolved = match self.scope() {
            // Placeholder substitution applies inside construct bodies; at
            // global scope the literal passes through unchanged.
            Scope::Root | Scope::Schema | Scope::Module | Scope::Deferred => {
                self.substitute(&node.literal)
            }
            Scope::Global => node.literal.clone(),
        };
    }

    fn substitute(&self, text: &str) -> String {
        let mut out = text.to_string();
        // The module placeholders need a module bound to the frame; the
        // build parameter placeholders do not.
        if matches!(
            self.scope(),
            Scope::Schema | Scope::Module | Scope::Deferred
        ) {
            if let Some(construct) = self.current_construct() {
                out = out.replace("%ModuleName%", &construct.name);
                if let Ok(path) = construct.str_of(module_fields::PATH) {
                    out = out.replace("%ModulePath%", path);
                }
            }
        }
        out.replace("%Configuration%", &self.order.configuration)
            .replace("%Platform%", self.order.platform.as_str())
            .replace("%Architecture%", self.order.architecture.as_str())
    }
}

fn display_shape(shape: &[ExprShape]) -> String {
    let parts: Vec<&str> = shape
        .iter()
        .map(|s| match s {
            ExprShape::String => "String",
            ExprShape::Array => "Array",
        })
        .collect();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::order::BuildOrder;
    use crate::dsl::parser::parse;
    use crate::engine::construct::{module_fields, root_fields};
    use crate::engine::types::{Architecture, Optimization, OutputType};

    fn run(source: &str) -> Result<ExecutionContext, ExecError> {
        run_with_order(source, BuildOrder::new("."))
    }

    fn run_with_order(source: &str, order: BuildOrder) -> Result<ExecutionContext, ExecError> {
        let mut program = parse("test.mqroot", source).expect("test source must parse");
        let mut ctx = ExecutionContext::new("test.mqroot", order);
        ctx.visit_program(&mut program)?;
        Ok(ctx)
    }

    #[test]
    fn test_version_must_be_first_statement() {
        let err = run(r#"DeclRoot("App") { Modules = []; }"#).unwrap_err();
        assert!(matches!(err, ExecError::VersionMustBeFirst { .. }));
    }

    #[test]
    fn test_version_redeclaration_fails() {
        let err = run(r#"DeclVersion("1.0"); DeclVersion("1.1")"#).unwrap_err();
        assert!(matches!(err, ExecError::VersionAlreadyDeclared { .. }));
    }

    #[test]
    fn test_version_unparsable() {
        let err = run(r#"DeclVersion("latest")"#).unwrap_err();
        assert!(matches!(err, ExecError::VersionUnparsable { .. }));
    }

    #[test]
    fn test_version_too_new() {
        let err = run(r#"DeclVersion("99.0")"#).unwrap_err();
        assert!(matches!(err, ExecError::VersionUnsupported { .. }));
    }

    #[test]
    fn test_declare_root_with_fields() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("App")
               {
                   Modules = ["Core"];
                   Configurations += "Shipping";
               }"#,
        )
        .unwrap();

        let root = &ctx.roots["App"];
        assert_eq!(root.modules().unwrap(), ["Core"]);
        assert_eq!(
            root.construct.arr_of(root_fields::CONFIGURATIONS).unwrap(),
            ["Debug", "Release", "Shipping"]
        );
    }

    #[test]
    fn test_duplicate_root_fails() {
        let err = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = []; };
               DeclRoot("App") { Modules = []; }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::DuplicateRoot { .. }));
    }

    #[test]
    fn test_unknown_directive_fails() {
        let err = run(r#"DeclVersion("1.1"); DeclareEverything("x")"#).unwrap_err();
        assert!(matches!(err, ExecError::UnknownDirective { .. }));
    }

    #[test]
    fn test_wrong_scope_lists_valid_scopes() {
        // ProtectField is only valid in module scope.
        let err = run(r#"DeclVersion("1.1"); ProtectField("Optimization")"#).unwrap_err();
        match err {
            ExecError::InvalidScope { valid, .. } => assert!(valid.contains("Module")),
            other => panic!("expected InvalidScope, got {other:?}"),
        }
    }

    #[test]
    fn test_bodily_directive_requires_body() {
        let err = run(r#"DeclVersion("1.1"); DeclRoot("App")"#).unwrap_err();
        assert!(matches!(err, ExecError::MissingBody { .. }));
    }

    #[test]
    fn test_non_bodily_directive_rejects_body() {
        let err = run(r#"DeclVersion("1.1") { Modules = []; }"#).unwrap_err();
        assert!(matches!(err, ExecError::UnexpectedBody { .. }));
    }

    #[test]
    fn test_overload_mismatch() {
        let err = run(r#"DeclVersion(["1.1"])"#).unwrap_err();
        assert!(matches!(err, ExecError::NoMatchingOverload { .. }));
    }

    #[test]
    fn test_global_scope_field_write_fails() {
        let err = run(r#"DeclVersion("1.1"); Modules = ["Core"]"#).unwrap_err();
        assert!(matches!(err, ExecError::NoConstructInScope { .. }));
    }

    #[test]
    fn test_unknown_field_fails() {
        let err = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { Favourite = "blue"; }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExecError::Field {
                source: FieldError::FieldDoesNotExist { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_append_to_string_field_fails() {
        let err = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { MainModule += "Core"; }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExecError::Field {
                source: FieldError::InvalidOperation { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_dubious_outside_deferred_fails() {
        let err = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { MainModule ?= "Core"; }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::DubiousOutsideDeferred { .. }));
    }

    fn module_fixture(schema_body: &str, module_body: &str) -> Result<ExecutionContext, ExecError> {
        run(&format!(
            r#"DeclVersion("1.1");
               DeclSchema("Common") {{ {schema_body} }};
               DeclRoot("App") {{ Modules = ["Core"]; }};
               DeclModule("Core", "Common") {{ {module_body} }}"#,
        ))
    }

    #[test]
    fn test_schema_defaults_then_module_overrides() {
        let ctx = module_fixture(
            r#"Optimization = "Balanced"; Definitions = ["FROM_SCHEMA"];"#,
            r#"Optimization = "Fastest";"#,
        )
        .unwrap();

        let module = &ctx.modules["Core"];
        assert_eq!(
            module
                .construct
                .enum_of::<Optimization>(module_fields::OPTIMIZATION)
                .unwrap(),
            Optimization::Fastest
        );
        assert_eq!(
            module.construct.arr_of(module_fields::DEFINITIONS).unwrap(),
            ["FROM_SCHEMA"]
        );
    }

    #[test]
    fn test_deferred_fallback_applies_to_untouched_field() {
        let ctx = module_fixture(
            r#"Defer() { OutputName ?= "FromTemplate"; };"#,
            r#"RootSourcePaths = ["Source"];"#,
        )
        .unwrap();

        assert_eq!(
            ctx.modules["Core"]
                .construct
                .str_of(module_fields::OUTPUT_NAME)
                .unwrap(),
            "FromTemplate"
        );
    }

    #[test]
    fn test_deferred_fallback_never_overwrites_module_value() {
        let ctx = module_fixture(
            r#"Defer() { OutputName ?= "FromTemplate"; };"#,
            r#"OutputName = "UserPick";"#,
        )
        .unwrap();

        assert_eq!(
            ctx.modules["Core"]
                .construct
                .str_of(module_fields::OUTPUT_NAME)
                .unwrap(),
            "UserPick"
        );
    }

    #[test]
    fn test_protect_blocks_deferred_fallback() {
        let ctx = module_fixture(
            r#"Defer() { OutputName ?= "FromTemplate"; };"#,
            r#"ProtectField("OutputName");"#,
        )
        .unwrap();

        // Field stays at its default (the module's own name).
        assert_eq!(
            ctx.modules["Core"]
                .construct
                .str_of(module_fields::OUTPUT_NAME)
                .unwrap(),
            "Core"
        );
    }

    #[test]
    fn test_ordinary_statement_in_deferred_block_fails() {
        let err = module_fixture(r#"Defer() { OutputName = "x"; };"#, "").unwrap_err();
        assert!(matches!(err, ExecError::StatementNotAllowedInDeferred { .. }));
    }

    #[test]
    fn test_non_conditional_directive_in_deferred_block_fails() {
        // No registered non-conditional directive lists the deferred scope,
        // so the scope check rejects this before the conditional-only rule
        // would.
        let err = module_fixture(r#"Defer() { ProtectField("OutputName"); };"#, "").unwrap_err();
        assert!(matches!(err, ExecError::InvalidScope { .. }));
    }

    #[test]
    fn test_module_requires_claiming_root() {
        let err = run(
            r#"DeclVersion("1.1");
               DeclModule("Orphan") { OutputType = "StaticLibrary"; }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::ModuleNotClaimed { .. }));
    }

    #[test]
    fn test_module_without_schema() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Core"]; };
               DeclModule("Core") { OutputType = "StaticLibrary"; }"#,
        )
        .unwrap();
        assert_eq!(
            ctx.modules["Core"]
                .construct
                .enum_of::<OutputType>(module_fields::OUTPUT_TYPE)
                .unwrap(),
            OutputType::StaticLibrary
        );
        assert!(ctx.modules["Core"].template.is_none());
    }

    #[test]
    fn test_unknown_schema_fails() {
        let err = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Core"]; };
               DeclModule("Core", "Ghost") { }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::UnknownSchema { .. }));
    }

    #[test]
    fn test_schema_allows_single_defer_only() {
        let err = run(
            r#"DeclVersion("1.1");
               DeclSchema("Common")
               {
                   Defer() { OutputName ?= "a"; };
                   Defer() { OutputName ?= "b"; };
               }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::MultipleDeferBlocks { .. }));
    }

    #[test]
    fn test_schema_instantiation_does_not_leak_between_modules() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclSchema("Common")
               {
                   OutputPath = "%ModuleName%/Out";
               };
               DeclRoot("App") { Modules = ["CoreA", "CoreB"]; };
               DeclModule("CoreA", "Common") { };
               DeclModule("CoreB", "Common") { }"#,
        )
        .unwrap();

        // Each instantiation resolves placeholders against its own module;
        // a stale resolution from CoreA must not bleed into CoreB.
        assert_eq!(
            ctx.modules["CoreA"]
                .construct
                .str_of(module_fields::OUTPUT_PATH)
                .unwrap(),
            "CoreA/Out"
        );
        assert_eq!(
            ctx.modules["CoreB"]
                .construct
                .str_of(module_fields::OUTPUT_PATH)
                .unwrap(),
            "CoreB/Out"
        );
    }

    #[test]
    fn test_placeholders_resolve_in_module_scope() {
        let order = BuildOrder::new(".")
            .with_configuration("Release")
            .with_architecture(Architecture::Arm64);
        let ctx = run_with_order(
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Core"]; };
               DeclModule("Core")
               {
                   IntermediatePath = "Obj/%Configuration%-%Architecture%";
               }"#,
            order,
        )
        .unwrap();

        assert_eq!(
            ctx.modules["Core"]
                .construct
                .str_of(module_fields::INTERMEDIATE_PATH)
                .unwrap(),
            "Obj/Release-ARM64"
        );
    }

    #[test]
    fn test_parameter_placeholders_resolve_in_root_scope() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { MainModule = "%Configuration%"; }"#,
        )
        .unwrap();
        assert_eq!(
            ctx.roots["App"]
                .construct
                .str_of(root_fields::MAIN_MODULE)
                .unwrap(),
            "Debug"
        );
    }

    #[test]
    fn test_module_placeholders_do_not_resolve_in_root_scope() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { MainModule = "%ModuleName%"; }"#,
        )
        .unwrap();
        assert_eq!(
            ctx.roots["App"]
                .construct
                .str_of(root_fields::MAIN_MODULE)
                .unwrap(),
            "%ModuleName%"
        );
    }

    #[test]
    fn test_placeholders_do_not_resolve_in_global_scope() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("%Configuration%") { Modules = []; }"#,
        )
        .unwrap();
        assert!(ctx.roots.contains_key("%Configuration%"));
    }

    #[test]
    fn test_conditional_takes_branch_on_match() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Core"]; };
               DeclModule("Core")
               {
                   IfPatternMatch("%Configuration%", "Deb*")
                   {
                       Definitions += "IS_DEBUG";
                   };
                   IfNotPatternMatch("%Configuration%", "Deb*")
                   {
                       Definitions += "NOT_DEBUG";
                   };
               }"#,
        )
        .unwrap();

        assert_eq!(
            ctx.modules["Core"]
                .construct
                .arr_of(module_fields::DEFINITIONS)
                .unwrap(),
            ["IS_DEBUG"]
        );
    }

    #[test]
    fn test_if_any_pattern_match() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Core"]; };
               DeclModule("Core")
               {
                   IfAnyPatternMatch("%Architecture%", ["ARM64", "x64"])
                   {
                       Definitions += "KNOWN_ARCH";
                   };
                   IfAnyPatternMatch("%Architecture%", ["mips", "riscv"])
                   {
                       Definitions += "EXOTIC_ARCH";
                   };
               }"#,
        )
        .unwrap();

        assert_eq!(
            ctx.modules["Core"]
                .construct
                .arr_of(module_fields::DEFINITIONS)
                .unwrap(),
            ["KNOWN_ARCH"]
        );
    }

    #[test]
    fn test_validation_mode_enters_every_branch() {
        let order = BuildOrder::new(".").for_validation(false);
        let err = run_with_order(
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Core"]; };
               DeclModule("Core")
               {
                   IfPatternMatch("%Configuration%", "NeverMatches")
                   {
                       NoSuchField = "boom";
                   };
               }"#,
            order,
        )
        .unwrap_err();

        // The branch cannot match, but validation mode enters it anyway and
        // surfaces the bad field write.
        assert!(matches!(
            err,
            ExecError::Field {
                source: FieldError::FieldDoesNotExist { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_unassign_restores_default() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("App")
               {
                   Configurations = ["OnlyOne"];
                   ~Configurations;
               }"#,
        )
        .unwrap();
        assert_eq!(
            ctx.roots["App"]
                .construct
                .arr_of(root_fields::CONFIGURATIONS)
                .unwrap(),
            ["Debug", "Release"]
        );
    }

    #[test]
    fn test_erase_removes_values() {
        let ctx = run(
            r#"DeclVersion("1.1");
               DeclRoot("App")
               {
                   Configurations -= "Release";
               }"#,
        )
        .unwrap();
        assert_eq!(
            ctx.roots["App"]
                .construct
                .arr_of(root_fields::CONFIGURATIONS)
                .unwrap(),
            ["Debug"]
        );
    }
}
