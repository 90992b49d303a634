//! `moonquake build` - resolve a description file into an ordered build graph.
//!
//! Interprets the file once canonically, re-resolves it for every
//! (configuration, architecture) pair, orders the chosen resolution's
//! modules, and emits the generated definitions headers and (optionally) a
//! JSON build plan. Driving an actual compiler is the business of an
//! external toolchain backend consuming the returned graph.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

use crate::build::emit::{build_plan_json, write_definitions_header};
use crate::build::graph::BuildGraph;
use crate::build::module::{BuildModule, BuildRoot};
use crate::build::order::BuildOrder;
use crate::build::resolver::{resolve_for_all, ResolutionKey};
use crate::dsl::parser;
use crate::engine::construct::root_fields;
use crate::engine::context::ExecutionContext;
use crate::engine::types::Architecture;
use crate::ops::description_path;
use crate::util::fs::{read_to_string, write_string};

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Treat the input as a directory holding `<dir>/<dirname>.mqroot`.
    pub directory: bool,
    /// Root to build; may be omitted when the file declares exactly one.
    pub root: Option<String>,
    /// Configuration to order the build for; defaults to the root's first.
    pub configuration: Option<String>,
    /// Architecture to order the build for; defaults to the host.
    pub architecture: Option<Architecture>,
    /// Write the JSON build plan here.
    pub emit_plan: Option<PathBuf>,
    /// Emit `Definitions.<Module>.h` headers for the chosen resolution.
    pub write_headers: bool,
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub filepath: PathBuf,
    pub root_name: String,
    /// Every resolution, keyed by (configuration, architecture).
    pub resolutions: BTreeMap<ResolutionKey, BuildRoot>,
    /// The resolution the build order was computed for.
    pub chosen: ResolutionKey,
    /// The chosen resolution's modules, dependencies first.
    pub ordered_modules: Vec<Arc<BuildModule>>,
    /// Paths of the emitted definitions headers.
    pub emitted_headers: Vec<PathBuf>,
}

pub fn build(input: &Path, options: &BuildOptions) -> Result<BuildOutcome> {
    let filepath = description_path(input, options.directory, "mqroot")?;
    let text = read_to_string(&filepath)?;
    let pristine = parser::parse(filepath.display().to_string(), text)
        .map_err(|e| anyhow!(e).context("failed to parse description file"))?;

    let base = filepath
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let mut canonical_program = pristine.clone();
    let mut canonical = ExecutionContext::new(&filepath, BuildOrder::new(base));
    canonical
        .visit_program(&mut canonical_program)
        .context("failed to interpret description file")?;

    let root_name = match &options.root {
        Some(name) => {
            if !canonical.roots.contains_key(name) {
                bail!(
                    "no root named '{}' is declared; available roots: {}",
                    name,
                    root_names(&canonical)
                );
            }
            name.clone()
        }
        None => {
            let mut names = canonical.roots.keys();
            match (names.next(), names.next()) {
                (Some(only), None) => only.clone(),
                (None, _) => bail!("the description file declares no roots"),
                (Some(_), Some(_)) => bail!(
                    "the description file declares several roots ({}); pick one with --root",
                    root_names(&canonical)
                ),
            }
        }
    };

    let resolutions = resolve_for_all(&pristine, &canonical, &root_name)
        .with_context(|| format!("failed to resolve root '{root_name}'"))?;

    let configuration = match &options.configuration {
        Some(config) => config.clone(),
        // Default to the root's first declared configuration.
        None => canonical.roots[&root_name]
            .construct
            .arr_of(root_fields::CONFIGURATIONS)
            .ok()
            .and_then(|configs| configs.first().cloned())
            .ok_or_else(|| anyhow!("root '{root_name}' has no configurations"))?,
    };
    let chosen = ResolutionKey {
        configuration,
        architecture: options.architecture.unwrap_or_else(Architecture::host),
    };
    let Some(chosen_root) = resolutions.get(&chosen) else {
        let known: Vec<String> = resolutions.keys().map(|k| k.to_string()).collect();
        bail!(
            "no resolution for '{chosen}'; available: {}",
            known.join(", ")
        );
    };

    let graph = BuildGraph::new(chosen_root)?;

    let mut emitted_headers = Vec::new();
    if options.write_headers {
        for module in &graph.modules {
            emitted_headers.push(write_definitions_header(module, &chosen)?);
        }
    }

    if let Some(plan_path) = &options.emit_plan {
        let json = build_plan_json(&resolutions)?;
        write_string(plan_path, &json)?;
        tracing::info!(path = %plan_path.display(), "wrote build plan");
    }

    Ok(BuildOutcome {
        filepath,
        root_name,
        chosen,
        ordered_modules: graph.modules,
        resolutions,
        emitted_headers,
    })
}

fn root_names(ctx: &ExecutionContext) -> String {
    let names: Vec<&str> = ctx.roots.keys().map(|n| n.as_str()).collect();
    names.join(", ")
}
