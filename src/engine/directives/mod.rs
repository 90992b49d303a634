//! Directive registry.
//!
//! Directives are registered once, globally, by name; duplicate registration
//! is a fatal startup error. Each directive declares its valid scopes, its
//! Bodily/Conditional flags, and a map from argument shape to handler.

mod conditional;
mod declarative;
mod include;
mod module;
mod system;

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::dsl::ast::{DirectiveNode, ExprShape};
use crate::engine::context::{ExecutionContext, Scope};
use crate::engine::exec::ExecError;

/// Literal names of the registered directives.
pub mod names {
    pub const DECLARE_VERSION: &str = "DeclVersion";
    pub const DECLARE_ROOT: &str = "DeclRoot";
    pub const DECLARE_SCHEMA: &str = "DeclSchema";
    pub const DECLARE_MODULE: &str = "DeclModule";
    pub const INCLUDE: &str = "Include";
    pub const IF_PATTERN_MATCH: &str = "IfPatternMatch";
    pub const IF_NOT_PATTERN_MATCH: &str = "IfNotPatternMatch";
    pub const IF_ANY_PATTERN_MATCH: &str = "IfAnyPatternMatch";
    pub const DEFER: &str = "Defer";
    pub const PROTECT_FIELD: &str = "ProtectField";
    pub const PROTECT_ALL_FIELDS: &str = "ProtectAllFields";
    pub const SYSTEM_CALL: &str = "SystemCall";
    pub const SYSTEM_EXEC_CALL: &str = "SystemExecCall";
}

pub type DirectiveHandler =
    fn(&mut ExecutionContext, &mut DirectiveNode) -> Result<(), ExecError>;

const BODILY: u8 = 1 << 0;
const CONDITIONAL: u8 = 1 << 1;

/// A registered directive.
pub struct Directive {
    pub name: &'static str,
    pub valid_scopes: &'static [Scope],
    flags: u8,
    overloads: &'static [(&'static [ExprShape], DirectiveHandler)],
}

impl Directive {
    pub fn is_bodily(&self) -> bool {
        self.flags & BODILY != 0
    }

    pub fn is_conditional(&self) -> bool {
        self.flags & CONDITIONAL != 0
    }

    /// Handler for the given argument shape, if an overload matches.
    pub fn overload(&self, shape: &[ExprShape]) -> Option<DirectiveHandler> {
        self.overloads
            .iter()
            .find(|(s, _)| *s == shape)
            .map(|(_, handler)| *handler)
    }

    pub fn valid_scopes_display(&self) -> String {
        let parts: Vec<String> = self.valid_scopes.iter().map(|s| s.to_string()).collect();
        parts.join(", ")
    }
}

const NO_ARGS: &[ExprShape] = &[];
const STR: &[ExprShape] = &[ExprShape::String];
const STR_STR: &[ExprShape] = &[ExprShape::String, ExprShape::String];
const STR_ARR: &[ExprShape] = &[ExprShape::String, ExprShape::Array];
const STR_STR_ARR: &[ExprShape] = &[ExprShape::String, ExprShape::String, ExprShape::Array];

const CONDITIONAL_SCOPES: &[Scope] = &[Scope::Root, Scope::Module, Scope::Schema, Scope::Deferred];
const CALL_SCOPES: &[Scope] = &[Scope::Global, Scope::Root, Scope::Schema, Scope::Module];

static DIRECTIVES: &[Directive] = &[
    Directive {
        name: names::DECLARE_VERSION,
        valid_scopes: &[Scope::Global],
        flags: 0,
        overloads: &[(STR, declarative::decl_version)],
    },
    Directive {
        name: names::DECLARE_ROOT,
        valid_scopes: &[Scope::Global],
        flags: BODILY,
        overloads: &[(STR, declarative::decl_root)],
    },
    Directive {
        name: names::DECLARE_SCHEMA,
        valid_scopes: &[Scope::Global],
        flags: BODILY,
        overloads: &[(STR, declarative::decl_schema)],
    },
    Directive {
        name: names::DECLARE_MODULE,
        valid_scopes: &[Scope::Global],
        flags: BODILY,
        overloads: &[
            (STR, declarative::decl_module),
            (STR_STR, declarative::decl_module_templated),
        ],
    },
    Directive {
        name: names::INCLUDE,
        valid_scopes: &[Scope::Global],
        flags: 0,
        overloads: &[(STR, include::include)],
    },
    Directive {
        name: names::IF_PATTERN_MATCH,
        valid_scopes: CONDITIONAL_SCOPES,
        flags: BODILY | CONDITIONAL,
        overloads: &[(STR_STR, conditional::if_pattern_match)],
    },
    Directive {
        name: names::IF_NOT_PATTERN_MATCH,
        valid_scopes: CONDITIONAL_SCOPES,
        flags: BODILY | CONDITIONAL,
        overloads: &[(STR_STR, conditional::if_not_pattern_match)],
    },
    Directive {
        name: names::IF_ANY_PATTERN_MATCH,
        valid_scopes: CONDITIONAL_SCOPES,
        flags: BODILY | CONDITIONAL,
        overloads: &[(STR_ARR, conditional::if_any_pattern_match)],
    },
    Directive {
        name: names::DEFER,
        valid_scopes: &[Scope::Schema],
        flags: BODILY,
        // Never executed as such: DeclSchema extracts the body at schema
        // declaration, and the node left inside the schema body is inert.
        overloads: &[(NO_ARGS, declarative::defer)],
    },
    Directive {
        name: names::PROTECT_FIELD,
        valid_scopes: &[Scope::Module],
        flags: 0,
        overloads: &[(STR, module::protect_field)],
    },
    Directive {
        name: names::PROTECT_ALL_FIELDS,
        valid_scopes: &[Scope::Module],
        flags: 0,
        overloads: &[(NO_ARGS, module::protect_all_fields)],
    },
    Directive {
        name: names::SYSTEM_CALL,
        valid_scopes: CALL_SCOPES,
        flags: 0,
        overloads: &[
            (STR_STR, system::system_call),
            (STR_STR_ARR, system::system_call),
        ],
    },
    Directive {
        name: names::SYSTEM_EXEC_CALL,
        valid_scopes: CALL_SCOPES,
        flags: 0,
        overloads: &[
            (STR_STR, system::system_exec_call),
            (STR_STR_ARR, system::system_exec_call),
        ],
    },
];

pub mod registry {
    use super::*;

    static REGISTRY: LazyLock<HashMap<&'static str, &'static Directive>> = LazyLock::new(|| {
        let mut map = HashMap::new();
        for directive in DIRECTIVES {
            if map.insert(directive.name, directive).is_some() {
                panic!("duplicate directive registration: {}", directive.name);
            }
        }
        map
    });

    pub fn find(name: &str) -> Option<&'static Directive> {
        REGISTRY.get(name).copied()
    }

    pub fn all() -> impl Iterator<Item = &'static Directive> {
        REGISTRY.values().copied()
    }
}

/// Visit a bodily directive's body. The execution contract has already
/// verified body presence for bodily directives.
pub(crate) fn visit_body(
    ctx: &mut ExecutionContext,
    node: &mut DirectiveNode,
) -> Result<(), ExecError> {
    match node.body.as_mut() {
        Some(body) => ctx.visit_program(body),
        None => Ok(()),
    }
}
