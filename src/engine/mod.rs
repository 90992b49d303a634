//! Construct model, directive registry, and the AST execution engine.

pub mod construct;
pub mod context;
pub mod directives;
pub mod exec;
pub mod field;
pub mod pattern;
pub mod types;

pub use construct::{module_fields, root_fields, Construct, Module, Root, Schema};
pub use context::{ExecutionContext, ExecutionFrame, FrameConstruct, Scope};
pub use exec::ExecError;
pub use field::{Field, FieldError, FieldFlags, FieldValueRef};
pub use pattern::PatternCache;
