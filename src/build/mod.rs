//! Finalization, configuration resolution, and build graph ordering.

pub mod emit;
pub mod finalizer;
pub mod graph;
pub mod module;
pub mod order;
pub mod resolver;

pub use finalizer::{finalize_root, FinalizeError};
pub use graph::{BuildGraph, GraphError};
pub use module::{api_macro, BuildModule, BuildRoot};
pub use order::BuildOrder;
pub use resolver::{resolve_for_all, ResolutionKey, ResolveError};
