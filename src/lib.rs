//! Moonquake - a declarative build-description engine for native C/C++
//! projects.
//!
//! A small declarative language describes build roots (solutions), modules
//! (compilation units with outputs), and schemas (reusable module
//! templates). This crate lexes and parses that language, interprets it
//! against a typed, scoped construct model, and finalizes the result into a
//! concrete per-configuration dependency graph ready to hand to a compiler
//! driver.
//!
//! The pipeline, in order:
//! - [`dsl`]: lexer, parser, AST, language versioning.
//! - [`engine`]: construct/field model, directive registry, and the
//!   tree-walking execution engine.
//! - [`build`]: finalization into [`build::BuildRoot`]s, per-configuration
//!   resolution, and topological build ordering.
//! - [`ops`]: the validate/build operations the CLI drives.

pub mod build;
pub mod dsl;
pub mod engine;
pub mod ops;
pub mod util;

pub use build::{
    api_macro, finalize_root, resolve_for_all, BuildGraph, BuildModule, BuildOrder, BuildRoot,
    FinalizeError, GraphError, ResolutionKey, ResolveError,
};
pub use dsl::{parse, LanguageVersion, LexError, Lexer, ParseError, Parser};
pub use engine::{ExecError, ExecutionContext, Module, Root, Schema};
