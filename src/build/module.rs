//! Finalized build structures.
//!
//! A [`Module`](crate::engine::Module) construct finalizes into a
//! [`BuildModule`]: fully path-resolved, sources discovered and classified,
//! dependencies and linkages bound to other finalized modules. A root
//! finalizes into a [`BuildRoot`]. Both are pure output of finalization;
//! nothing mutates them afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::types::{
    Architecture, LanguageStandard, Optimization, OutputType, RuntimeLibraries,
};

/// A fully resolved module, ready to be compiled and linked.
#[derive(Debug, Clone)]
pub struct BuildModule {
    pub name: String,

    /// Absolute module root directory.
    pub module_path: PathBuf,

    /// Output binary name (without platform prefix/extension).
    pub output_name: String,

    /// Absolute output directory.
    pub output_path: PathBuf,

    /// Absolute intermediate/object directory.
    pub object_path: PathBuf,

    pub output_type: OutputType,
    pub runtime_libraries: RuntimeLibraries,
    pub language_standard: LanguageStandard,
    pub optimization: Optimization,
    pub debug_symbols: bool,

    /// Discovered and explicitly listed header files, absolute.
    pub header_files: Vec<PathBuf>,

    /// Discovered and explicitly listed translation units, absolute.
    pub translation_units: Vec<PathBuf>,

    /// Include search paths, absolute; contains every direct dependency's
    /// exposed paths in addition to the module's own.
    pub include_paths: Vec<PathBuf>,

    /// Include paths this module offers to its dependents, absolute;
    /// accumulates transitively through finalization.
    pub exposed_include_paths: Vec<PathBuf>,

    /// Preprocessor definitions, `NAME` or `NAME=VALUE`, deduplicated by
    /// macro name.
    pub definitions: Vec<String>,

    /// Raw libraries outside the build graph (e.g. `winmm.lib`).
    pub libraries: Vec<String>,

    /// Modules that must be built before this one.
    pub dependencies: BTreeMap<String, Arc<BuildModule>>,

    /// Subset of `dependencies` that is also linked against.
    pub linkages: BTreeMap<String, Arc<BuildModule>>,
}

impl BuildModule {
    /// Directory generated intermediate headers for this module are emitted
    /// into, per (configuration, architecture).
    pub fn generated_includes_dir(
        &self,
        configuration: &str,
        architecture: Architecture,
    ) -> PathBuf {
        self.module_path
            .join("Intermediate")
            .join(format!("{configuration}-{architecture}"))
            .join("Include")
    }
}

/// The API macro name a module's shared headers use to export or import
/// symbols: the module name upper-cased with spaces removed, suffixed `_API`.
pub fn api_macro(module_name: &str) -> String {
    let mut name: String = module_name
        .chars()
        .filter(|c| *c != ' ')
        .collect::<String>()
        .to_uppercase();
    name.push_str("_API");
    name
}

/// A fully resolved root: every module finalized, the main module chosen,
/// and the command strings synthesized.
#[derive(Debug, Clone)]
pub struct BuildRoot {
    pub name: String,

    /// Absolute root directory.
    pub root_path: PathBuf,

    pub configurations: Vec<String>,
    pub architectures: Vec<String>,
    pub platforms: Vec<String>,

    /// Every finalized module of the root, keyed by name. Dependencies are
    /// memoized here during finalization, so the map covers the transitive
    /// closure.
    pub modules: BTreeMap<String, Arc<BuildModule>>,

    /// Name of the executable module builds start from, if any.
    pub main_module: Option<String>,

    pub build_command: String,
    pub rebuild_command: String,
    pub clean_command: String,
}

impl BuildRoot {
    pub fn main_module(&self) -> Option<&Arc<BuildModule>> {
        self.main_module.as_ref().and_then(|name| self.modules.get(name))
    }
}
