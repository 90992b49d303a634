//! Finalization: construct graph to concrete build graph.
//!
//! Takes an interpreted [`ExecutionContext`] and one chosen root, and
//! reduces the declared constructs into a [`BuildRoot`] with absolute paths,
//! classified sources, deduplicated definitions, and resolved
//! dependency/linkage edges. Module finalization is recursive with an
//! explicit in-progress deny list, so any dependency cycle is caught here
//! and named.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use walkdir::WalkDir;

use crate::build::module::{api_macro, BuildModule, BuildRoot};
use crate::engine::construct::{module_fields, root_fields, Root};
use crate::engine::context::ExecutionContext;
use crate::engine::field::FieldError;
use crate::engine::types::OutputType;
use crate::util::fs::absolute_from;

/// File extensions classified as C/C++ headers.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++"];

/// File extensions classified as C/C++ translation units.
pub const TRANSLATION_UNIT_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++"];

/// A finalization failure. Always names the offending construct(s).
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("no root named '{name}' was declared")]
    UnknownRoot { name: String },

    #[error("module '{module}', listed in root '{root}', was never declared")]
    ModuleNeverDeclared { module: String, root: String },

    #[error("module '{module}' references module '{target}', but no such module was declared")]
    ReferenceNeverDeclared { module: String, target: String },

    #[error(
        "module '{module}' references module '{target}', which is not part of root '{root}'; \
         cross-root module references are illegal"
    )]
    CrossRootReference {
        module: String,
        target: String,
        root: String,
    },

    #[error(
        "module '{module}' both links against and depends on module '{target}'; \
         it must do one or the other"
    )]
    OverlappingLinkage { module: String, target: String },

    #[error("module '{module}' defines macro '{name}' more than once")]
    DuplicateDefinition { module: String, name: String },

    #[error("cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("module '{module}' lists source file '{file}', which does not exist")]
    MissingSourceFile { module: String, file: String },

    #[error(
        "module '{module}' lists source file '{file}', which is neither a header \
         nor a translation unit"
    )]
    UnclassifiedSource { module: String, file: String },

    #[error(
        "module '{module}', chosen as the main module of root '{root}', was never declared"
    )]
    MainModuleNeverDeclared { module: String, root: String },

    #[error(
        "module '{module}', chosen as the main module of root '{root}', is not part of the \
         root; add it to the root's Modules field"
    )]
    MainModuleNotInRoot { module: String, root: String },

    #[error(
        "module '{module}', chosen as the main module of root '{root}', has output type \
         '{output_type}'; only executables can be main modules"
    )]
    MainModuleNotExecutable {
        module: String,
        root: String,
        output_type: OutputType,
    },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("filesystem error at '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Finalize one declared root into a concrete build graph.
pub fn finalize_root(
    ctx: &ExecutionContext,
    root_name: &str,
) -> Result<BuildRoot, FinalizeError> {
    let root = ctx
        .roots
        .get(root_name)
        .ok_or_else(|| FinalizeError::UnknownRoot {
            name: root_name.to_string(),
        })?;
    let construct = &root.construct;

    let file_dir = construct
        .filepath
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let base_dir = absolute_from(&ctx.order.base_path, &file_dir);
    let root_path = absolute_from(&base_dir, Path::new(construct.str_of(root_fields::PATH)?));

    let mut out = BuildRoot {
        name: root_name.to_string(),
        root_path,
        configurations: construct.arr_of(root_fields::CONFIGURATIONS)?.to_vec(),
        architectures: construct.arr_of(root_fields::ARCHITECTURES)?.to_vec(),
        platforms: construct.arr_of(root_fields::PLATFORMS)?.to_vec(),
        modules: BTreeMap::new(),
        main_module: None,
        build_command: command_of(root, root_fields::BUILD_COMMAND, "build", &[])?,
        rebuild_command: command_of(root, root_fields::REBUILD_COMMAND, "build", &["--rebuild"])?,
        clean_command: command_of(root, root_fields::CLEAN_COMMAND, "clean", &[])?,
    };

    let module_names = root.modules()?.to_vec();
    let mut in_progress = Vec::new();
    for name in &module_names {
        if out.modules.contains_key(name) {
            continue;
        }
        finalize_module(ctx, root, name, &mut out, &mut in_progress)?;
    }

    let explicit = construct.str_of(root_fields::MAIN_MODULE)?.to_string();
    if explicit.is_empty() {
        // Pick the first executable module, iterating in declared order so
        // the choice is deterministic.
        for name in &module_names {
            let Some(module) = out.modules.get(name) else {
                continue;
            };
            if module.output_type.is_executable() {
                out.main_module = Some(name.clone());
                break;
            }
        }
        if out.main_module.is_none() {
            tracing::warn!(
                root = root_name,
                "no executable module found; fine for library-only roots"
            );
        }
    } else {
        if !ctx.modules.contains_key(&explicit) {
            return Err(FinalizeError::MainModuleNeverDeclared {
                module: explicit,
                root: root_name.to_string(),
            });
        }
        let Some(module) = out.modules.get(&explicit) else {
            return Err(FinalizeError::MainModuleNotInRoot {
                module: explicit,
                root: root_name.to_string(),
            });
        };
        if !module.output_type.is_executable() {
            return Err(FinalizeError::MainModuleNotExecutable {
                module: explicit,
                root: root_name.to_string(),
                output_type: module.output_type,
            });
        }
        out.main_module = Some(explicit);
    }

    Ok(out)
}

fn finalize_module(
    ctx: &ExecutionContext,
    root: &Root,
    name: &str,
    out: &mut BuildRoot,
    in_progress: &mut Vec<String>,
) -> Result<Arc<BuildModule>, FinalizeError> {
    // A dependency reachable both directly and transitively finalizes once.
    if let Some(done) = out.modules.get(name) {
        return Ok(done.clone());
    }
    if in_progress.iter().any(|n| n == name) {
        let mut cycle = in_progress.clone();
        cycle.push(name.to_string());
        return Err(FinalizeError::CyclicDependency { cycle });
    }

    let module = ctx
        .modules
        .get(name)
        .ok_or_else(|| FinalizeError::ModuleNeverDeclared {
            module: name.to_string(),
            root: root.name().to_string(),
        })?;
    let construct = &module.construct;

    let file_dir = absolute_from(
        &ctx.order.base_path,
        construct.filepath.parent().unwrap_or_else(|| Path::new(".")),
    );

    let module_path = absolute_from(&file_dir, Path::new(construct.str_of(module_fields::PATH)?));
    let output_path = absolute_from(
        &file_dir,
        Path::new(construct.str_of(module_fields::OUTPUT_PATH)?),
    );
    let object_path = absolute_from(
        &file_dir,
        Path::new(construct.str_of(module_fields::INTERMEDIATE_PATH)?),
    );
    for dir in [&module_path, &output_path, &object_path] {
        create_dir(dir)?;
    }

    // Source discovery: recursive walk of every root source path, plus
    // explicitly listed files which must exist and classify.
    let mut header_files = Vec::new();
    let mut translation_units = Vec::new();
    for source_dir in dedup(construct.arr_of(module_fields::ROOT_SOURCE_PATHS)?) {
        let dir = absolute_from(&file_dir, Path::new(&source_dir));
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(|e| FinalizeError::Io {
                path: dir.display().to_string(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            match classify(entry.path()) {
                Some(SourceKind::Header) => header_files.push(entry.into_path()),
                Some(SourceKind::TranslationUnit) => translation_units.push(entry.into_path()),
                None => {}
            }
        }
    }
    for source_file in dedup(construct.arr_of(module_fields::SOURCE_FILES)?) {
        let path = absolute_from(&file_dir, Path::new(&source_file));
        if !path.is_file() {
            return Err(FinalizeError::MissingSourceFile {
                module: name.to_string(),
                file: path.display().to_string(),
            });
        }
        match classify(&path) {
            Some(SourceKind::Header) => header_files.push(path),
            Some(SourceKind::TranslationUnit) => translation_units.push(path),
            None => {
                return Err(FinalizeError::UnclassifiedSource {
                    module: name.to_string(),
                    file: path.display().to_string(),
                });
            }
        }
    }
    header_files.sort();
    header_files.dedup();
    translation_units.sort();
    translation_units.dedup();

    let mut include_paths: Vec<PathBuf> = dedup(construct.arr_of(module_fields::INCLUDE_PATHS)?)
        .into_iter()
        .map(|p| absolute_from(&file_dir, Path::new(&p)))
        .collect();
    let mut exposed_include_paths: Vec<PathBuf> =
        dedup(construct.arr_of(module_fields::EXPOSED_INCLUDE_PATHS)?)
            .into_iter()
            .map(|p| absolute_from(&file_dir, Path::new(&p)))
            .collect();

    // Definitions: platform import/export tokens and the bookkeeping macros
    // first, then the module's own, all deduplicated by macro name.
    let mut definitions = Vec::new();
    let mut seen_macros = BTreeSet::new();
    let platform = ctx.order.platform;
    for synthesized in [
        format!("DLLIMPORT={}", platform.dll_import_token()),
        format!("DLLEXPORT={}", platform.dll_export_token()),
        format!("MODULE_NAME=\"{name}\""),
    ] {
        push_definition(&mut definitions, &mut seen_macros, name, synthesized)?;
    }

    let output_type = construct.enum_of::<OutputType>(module_fields::OUTPUT_TYPE)?;
    push_definition(
        &mut definitions,
        &mut seen_macros,
        name,
        api_definition(name, output_type, true),
    )?;

    for definition in dedup(construct.arr_of(module_fields::DEFINITIONS)?) {
        push_definition(&mut definitions, &mut seen_macros, name, definition)?;
    }

    let libraries = dedup(construct.arr_of(module_fields::LIBRARIES)?);

    // Linkages are dependencies that are also linked against; DependsOn
    // entries are dependencies only. A name may never appear in both.
    let links = dedup(construct.arr_of(module_fields::LINKAGES)?);
    let prerequisites = dedup(construct.arr_of(module_fields::DEPENDS_ON)?);

    let mut dependencies = BTreeMap::new();
    let mut linkages = BTreeMap::new();
    for target in &links {
        let dep = resolve_reference(ctx, root, name, target, out, in_progress)?;
        linkages.insert(target.clone(), dep.clone());
        dependencies.insert(target.clone(), dep);
    }
    for target in &prerequisites {
        if links.contains(target) {
            return Err(FinalizeError::OverlappingLinkage {
                module: name.to_string(),
                target: target.clone(),
            });
        }
        let dep = resolve_reference(ctx, root, name, target, out, in_progress)?;
        dependencies.insert(target.clone(), dep);
    }

    // One-hop include propagation. Each dependency already accumulated its
    // own dependencies' exposed paths, so indirect exposure arrives here
    // without re-walking the graph.
    for dep in dependencies.values() {
        for path in &dep.exposed_include_paths {
            if !include_paths.contains(path) {
                include_paths.push(path.clone());
            }
            if !exposed_include_paths.contains(path) {
                exposed_include_paths.push(path.clone());
            }
        }
    }

    // One API macro per module in scope, keyed on whether the producer is a
    // dynamic library; a shared header can then use a single macro name no
    // matter how the consumer links the producer.
    for (dep_name, dep) in &dependencies {
        push_definition(
            &mut definitions,
            &mut seen_macros,
            name,
            api_definition(dep_name, dep.output_type, false),
        )?;
    }

    let built = Arc::new(BuildModule {
        name: name.to_string(),
        module_path,
        output_name: construct.str_of(module_fields::OUTPUT_NAME)?.to_string(),
        output_path,
        object_path,
        output_type,
        runtime_libraries: construct.enum_of(module_fields::RUNTIME_LIBRARIES)?,
        language_standard: construct.enum_of(module_fields::LANGUAGE_STANDARD)?,
        optimization: construct.enum_of(module_fields::OPTIMIZATION)?,
        debug_symbols: construct.bool_of(module_fields::DEBUG_SYMBOLS)?,
        header_files,
        translation_units,
        include_paths,
        exposed_include_paths,
        definitions,
        libraries,
        dependencies,
        linkages,
    });

    tracing::debug!(module = name, "finalized module");
    out.modules.insert(name.to_string(), built.clone());
    Ok(built)
}

/// Resolve and finalize one referenced module, enforcing declaration and
/// same-root membership.
fn resolve_reference(
    ctx: &ExecutionContext,
    root: &Root,
    module: &str,
    target: &str,
    out: &mut BuildRoot,
    in_progress: &mut Vec<String>,
) -> Result<Arc<BuildModule>, FinalizeError> {
    if !ctx.modules.contains_key(target) {
        return Err(FinalizeError::ReferenceNeverDeclared {
            module: module.to_string(),
            target: target.to_string(),
        });
    }
    if !root.modules()?.contains(&target.to_string()) {
        return Err(FinalizeError::CrossRootReference {
            module: module.to_string(),
            target: target.to_string(),
            root: root.name().to_string(),
        });
    }

    in_progress.push(module.to_string());
    let result = finalize_module(ctx, root, target, out, in_progress);
    in_progress.pop();
    result
}

enum SourceKind {
    Header,
    TranslationUnit,
}

fn classify(path: &Path) -> Option<SourceKind> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    if HEADER_EXTENSIONS.contains(&extension.as_str()) {
        return Some(SourceKind::Header);
    }
    if TRANSLATION_UNIT_EXTENSIONS.contains(&extension.as_str()) {
        return Some(SourceKind::TranslationUnit);
    }
    None
}

/// Order-preserving dedup of a field's values.
fn dedup(values: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

/// Name of the macro a definition introduces: everything before `=`, if any.
fn macro_name(definition: &str) -> &str {
    definition.split_once('=').map_or(definition, |(n, _)| n)
}

fn push_definition(
    definitions: &mut Vec<String>,
    seen: &mut BTreeSet<String>,
    module: &str,
    definition: String,
) -> Result<(), FinalizeError> {
    let name = macro_name(&definition).to_string();
    if !seen.insert(name.clone()) {
        return Err(FinalizeError::DuplicateDefinition {
            module: module.to_string(),
            name,
        });
    }
    definitions.push(definition);
    Ok(())
}

/// The `<NAME>_API` definition for a module in scope: bound to the export
/// token when building the dynamic library itself, the import token when
/// consuming one, and empty otherwise.
fn api_definition(module_name: &str, output_type: OutputType, building_self: bool) -> String {
    let macro_name = api_macro(module_name);
    if output_type != OutputType::DynamicLibrary {
        return macro_name;
    }
    if building_self {
        format!("{macro_name}=DLLEXPORT")
    } else {
        format!("{macro_name}=DLLIMPORT")
    }
}

fn create_dir(path: &Path) -> Result<(), FinalizeError> {
    fs::create_dir_all(path).map_err(|source| FinalizeError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Synthesized or user-overridden root command string.
fn command_of(
    root: &Root,
    field: &str,
    verb: &str,
    extra: &[&str],
) -> Result<String, FieldError> {
    let construct = &root.construct;
    if !construct.field(field)?.flags().is_unset() {
        return Ok(construct.str_of(field)?.to_string());
    }
    let mut command = format!(
        "moonquake {verb} \"{}\" --root \"{}\"",
        construct.filepath.display(),
        construct.name
    );
    for arg in extra {
        command.push(' ');
        command.push_str(arg);
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::order::BuildOrder;
    use crate::dsl::parser::parse;
    use crate::engine::types::Platform;

    use std::fs;
    use tempfile::TempDir;

    /// Interpret a description source against a real directory and finalize
    /// the given root.
    fn finalize_fixture(
        tmp: &TempDir,
        source: &str,
        root_name: &str,
    ) -> Result<BuildRoot, FinalizeError> {
        let filepath = tmp.path().join("app.mqroot");
        fs::write(&filepath, source).unwrap();
        let mut program = parse(filepath.display().to_string(), source).expect("must parse");
        let mut ctx = ExecutionContext::new(&filepath, BuildOrder::new(tmp.path()));
        ctx.visit_program(&mut program).expect("must interpret");
        finalize_root(&ctx, root_name)
    }

    fn write_sources(tmp: &TempDir, files: &[&str]) {
        for file in files {
            let path = tmp.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "// test source\n").unwrap();
        }
    }

    #[test]
    fn test_end_to_end_console_executable() {
        let tmp = TempDir::new().unwrap();
        write_sources(&tmp, &["Source/Main.cpp", "Source/Main.h", "Source/notes.txt"]);

        let root = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Game"]; };
               DeclModule("Game")
               {
                   OutputType = "ConsoleExecutable";
                   RootSourcePaths = ["Source"];
               }"#,
            "App",
        )
        .unwrap();

        assert_eq!(root.main_module.as_deref(), Some("Game"));
        let game = &root.modules["Game"];
        assert_eq!(
            game.translation_units,
            vec![tmp.path().join("Source/Main.cpp")]
        );
        assert_eq!(game.header_files, vec![tmp.path().join("Source/Main.h")]);
        assert!(game.output_path.is_absolute());
        assert!(game.object_path.exists());
    }

    #[test]
    fn test_unknown_root() {
        let tmp = TempDir::new().unwrap();
        let err = finalize_fixture(&tmp, r#"DeclVersion("1.1");"#, "Ghost").unwrap_err();
        assert!(matches!(err, FinalizeError::UnknownRoot { .. }));
    }

    #[test]
    fn test_listed_module_never_declared() {
        let tmp = TempDir::new().unwrap();
        let err = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Missing"]; }"#,
            "App",
        )
        .unwrap_err();
        assert!(matches!(err, FinalizeError::ModuleNeverDeclared { .. }));
    }

    #[test]
    fn test_dependency_cycle_names_both_modules() {
        let tmp = TempDir::new().unwrap();
        let err = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["A", "B"]; };
               DeclModule("A") { OutputType = "StaticLibrary"; Linkages = ["B"]; };
               DeclModule("B") { OutputType = "StaticLibrary"; Linkages = ["A"]; }"#,
            "App",
        )
        .unwrap_err();

        match err {
            FinalizeError::CyclicDependency { cycle } => {
                assert!(cycle.contains(&"A".to_string()));
                assert!(cycle.contains(&"B".to_string()));
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_overlapping_linkage_and_dependency() {
        let tmp = TempDir::new().unwrap();
        let err = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["A", "B"]; };
               DeclModule("A")
               {
                   OutputType = "StaticLibrary";
                   Linkages = ["B"];
                   DependsOn = ["B"];
               };
               DeclModule("B") { OutputType = "StaticLibrary"; }"#,
            "App",
        )
        .unwrap_err();
        assert!(matches!(err, FinalizeError::OverlappingLinkage { .. }));
    }

    #[test]
    fn test_cross_root_reference_is_illegal() {
        let tmp = TempDir::new().unwrap();
        let err = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["A"]; };
               DeclRoot("Other") { Modules = ["B"]; };
               DeclModule("A") { OutputType = "StaticLibrary"; Linkages = ["B"]; };
               DeclModule("B") { OutputType = "StaticLibrary"; }"#,
            "App",
        )
        .unwrap_err();
        assert!(matches!(err, FinalizeError::CrossRootReference { .. }));
    }

    #[test]
    fn test_duplicate_macro_definition() {
        let tmp = TempDir::new().unwrap();
        let err = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["A"]; };
               DeclModule("A")
               {
                   OutputType = "StaticLibrary";
                   Definitions = ["LIMIT=1", "LIMIT=2"];
               }"#,
            "App",
        )
        .unwrap_err();
        match err {
            FinalizeError::DuplicateDefinition { name, .. } => assert_eq!(name, "LIMIT"),
            other => panic!("expected duplicate definition, got {other:?}"),
        }
    }

    #[test]
    fn test_identical_definitions_are_deduplicated_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let root = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["A"]; };
               DeclModule("A")
               {
                   OutputType = "StaticLibrary";
                   Definitions = ["LIMIT=1", "LIMIT=1"];
               }"#,
            "App",
        )
        .unwrap();
        let defs = &root.modules["A"].definitions;
        assert_eq!(defs.iter().filter(|d| d.starts_with("LIMIT")).count(), 1);
    }

    #[test]
    fn test_missing_explicit_source_file() {
        let tmp = TempDir::new().unwrap();
        let err = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["A"]; };
               DeclModule("A")
               {
                   OutputType = "StaticLibrary";
                   SourceFiles = ["DoesNotExist.cpp"];
               }"#,
            "App",
        )
        .unwrap_err();
        assert!(matches!(err, FinalizeError::MissingSourceFile { .. }));
    }

    #[test]
    fn test_unclassifiable_explicit_source_file() {
        let tmp = TempDir::new().unwrap();
        write_sources(&tmp, &["data.bin"]);
        let err = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["A"]; };
               DeclModule("A")
               {
                   OutputType = "StaticLibrary";
                   SourceFiles = ["data.bin"];
               }"#,
            "App",
        )
        .unwrap_err();
        assert!(matches!(err, FinalizeError::UnclassifiedSource { .. }));
    }

    #[test]
    fn test_explicit_main_module_must_be_executable() {
        let tmp = TempDir::new().unwrap();
        let err = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App")
               {
                   Modules = ["Lib"];
                   MainModule = "Lib";
               };
               DeclModule("Lib") { OutputType = "StaticLibrary"; }"#,
            "App",
        )
        .unwrap_err();
        assert!(matches!(err, FinalizeError::MainModuleNotExecutable { .. }));
    }

    #[test]
    fn test_library_only_root_is_valid_without_main_module() {
        let tmp = TempDir::new().unwrap();
        let root = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Lib"]; };
               DeclModule("Lib") { OutputType = "StaticLibrary"; }"#,
            "App",
        )
        .unwrap();
        assert!(root.main_module.is_none());
    }

    #[test]
    fn test_exposed_includes_propagate_one_hop_and_transitively() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("base/Public")).unwrap();
        fs::create_dir_all(tmp.path().join("mid/Public")).unwrap();

        let root = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Top", "Mid", "Base"]; };
               DeclModule("Base")
               {
                   OutputType = "StaticLibrary";
                   ExposedIncludePaths = ["base/Public"];
               };
               DeclModule("Mid")
               {
                   OutputType = "StaticLibrary";
                   Linkages = ["Base"];
                   ExposedIncludePaths = ["mid/Public"];
               };
               DeclModule("Top")
               {
                   OutputType = "ConsoleExecutable";
                   DependsOn = ["Mid"];
               }"#,
            "App",
        )
        .unwrap();

        let base_public = tmp.path().join("base/Public");
        let mid_public = tmp.path().join("mid/Public");

        let mid = &root.modules["Mid"];
        assert!(mid.include_paths.contains(&base_public));
        // Mid re-exposes what it absorbed from Base.
        assert!(mid.exposed_include_paths.contains(&base_public));
        assert!(mid.exposed_include_paths.contains(&mid_public));

        // Top only looks one hop deep, yet still sees Base's exposure, and a
        // DependsOn-only edge propagates the same as a linkage.
        let top = &root.modules["Top"];
        assert!(top.include_paths.contains(&mid_public));
        assert!(top.include_paths.contains(&base_public));
        assert!(top.linkages.is_empty());
        assert_eq!(top.dependencies.len(), 1);
    }

    #[test]
    fn test_api_macros_follow_output_type() {
        let tmp = TempDir::new().unwrap();
        let root = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["Game", "Engine", "Tools"]; };
               DeclModule("Engine") { OutputType = "DynamicLibrary"; };
               DeclModule("Tools") { OutputType = "StaticLibrary"; };
               DeclModule("Game")
               {
                   OutputType = "ConsoleExecutable";
                   Linkages = ["Engine", "Tools"];
               }"#,
            "App",
        )
        .unwrap();

        let engine = &root.modules["Engine"];
        assert!(engine
            .definitions
            .contains(&"ENGINE_API=DLLEXPORT".to_string()));

        let game = &root.modules["Game"];
        assert!(game.definitions.contains(&"GAME_API".to_string()));
        assert!(game
            .definitions
            .contains(&"ENGINE_API=DLLIMPORT".to_string()));
        assert!(game.definitions.contains(&"TOOLS_API".to_string()));
        assert!(game
            .definitions
            .contains(&"MODULE_NAME=\"Game\"".to_string()));

        let expected_import = format!("DLLIMPORT={}", Platform::host().dll_import_token());
        assert!(game.definitions.contains(&expected_import));
    }

    #[test]
    fn test_linkages_are_subset_of_dependencies() {
        let tmp = TempDir::new().unwrap();
        let root = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App") { Modules = ["A", "B", "C"]; };
               DeclModule("A")
               {
                   OutputType = "ConsoleExecutable";
                   Linkages = ["B"];
                   DependsOn = ["C"];
               };
               DeclModule("B") { OutputType = "StaticLibrary"; };
               DeclModule("C") { OutputType = "StaticLibrary"; }"#,
            "App",
        )
        .unwrap();

        let a = &root.modules["A"];
        assert!(a.linkages.contains_key("B"));
        assert!(!a.linkages.contains_key("C"));
        assert!(a.dependencies.contains_key("B"));
        assert!(a.dependencies.contains_key("C"));
        for name in a.linkages.keys() {
            assert!(a.dependencies.contains_key(name));
        }
    }

    #[test]
    fn test_synthesized_commands_and_overrides() {
        let tmp = TempDir::new().unwrap();
        let root = finalize_fixture(
            &tmp,
            r#"DeclVersion("1.1");
               DeclRoot("App")
               {
                   Modules = [];
                   CleanCommand = "custom-clean";
               }"#,
            "App",
        )
        .unwrap();

        assert!(root.build_command.starts_with("moonquake build "));
        assert!(root.build_command.contains("--root \"App\""));
        assert!(root.rebuild_command.ends_with("--rebuild"));
        assert_eq!(root.clean_command, "custom-clean");
    }
}
