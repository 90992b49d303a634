//! Generated artifacts: definitions headers and the JSON build plan.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::build::graph::BuildGraph;
use crate::build::module::{BuildModule, BuildRoot};
use crate::build::resolver::ResolutionKey;
use crate::engine::types::{LanguageStandard, Optimization, OutputType};
use crate::util::fs::write_string;

/// Emit `Definitions.<ModuleName>.h` into the module's generated
/// intermediates directory for the given build parameters. One `#define`
/// line per resolved definition; entries without `=` become bare defines.
pub fn write_definitions_header(
    module: &BuildModule,
    key: &ResolutionKey,
) -> Result<PathBuf> {
    let dir = module.generated_includes_dir(&key.configuration, key.architecture);
    let path = dir.join(format!("Definitions.{}.h", module.name));

    let mut content = String::new();
    for definition in &module.definitions {
        match definition.split_once('=') {
            Some((name, value)) => content.push_str(&format!("#define {name} {value}\n")),
            None => content.push_str(&format!("#define {definition}\n")),
        }
    }

    write_string(&path, &content)?;
    Ok(path)
}

#[derive(Debug, Serialize)]
struct PlanModule {
    name: String,
    module_path: PathBuf,
    output_name: String,
    output_path: PathBuf,
    object_path: PathBuf,
    output_type: OutputType,
    language_standard: LanguageStandard,
    optimization: Optimization,
    debug_symbols: bool,
    translation_units: Vec<PathBuf>,
    header_files: Vec<PathBuf>,
    include_paths: Vec<PathBuf>,
    definitions: Vec<String>,
    libraries: Vec<String>,
    dependencies: Vec<String>,
    linkages: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PlanResolution {
    configuration: String,
    architecture: String,
    root: String,
    main_module: Option<String>,
    /// Module names in build order, dependencies first.
    build_order: Vec<String>,
    modules: Vec<PlanModule>,
}

/// Serialize every resolution into a JSON build plan.
pub fn build_plan_json(resolutions: &BTreeMap<ResolutionKey, BuildRoot>) -> Result<String> {
    let mut plan = Vec::new();
    for (key, root) in resolutions {
        let ordered = BuildGraph::new(root)?;
        plan.push(PlanResolution {
            configuration: key.configuration.clone(),
            architecture: key.architecture.to_string(),
            root: root.name.clone(),
            main_module: root.main_module.clone(),
            build_order: ordered.modules.iter().map(|m| m.name.clone()).collect(),
            modules: ordered
                .modules
                .iter()
                .map(|m| PlanModule {
                    name: m.name.clone(),
                    module_path: m.module_path.clone(),
                    output_name: m.output_name.clone(),
                    output_path: m.output_path.clone(),
                    object_path: m.object_path.clone(),
                    output_type: m.output_type,
                    language_standard: m.language_standard,
                    optimization: m.optimization,
                    debug_symbols: m.debug_symbols,
                    translation_units: m.translation_units.clone(),
                    header_files: m.header_files.clone(),
                    include_paths: m.include_paths.clone(),
                    definitions: m.definitions.clone(),
                    libraries: m.libraries.clone(),
                    dependencies: m.dependencies.keys().cloned().collect(),
                    linkages: m.linkages.keys().cloned().collect(),
                })
                .collect(),
        });
    }

    Ok(serde_json::to_string_pretty(&plan)?)
}
