//! Configuration resolution: one finalization per build parameter pair.
//!
//! Re-runs the whole visit-and-finalize cycle for every (configuration,
//! architecture) pair — configurations come from the canonical root,
//! architectures are every member of the enumeration so architecture-gated
//! divergence is always exercised. Each pass deep-clones the pristine AST
//! and builds a fresh execution context, so passes share nothing mutable
//! and run in parallel. Afterwards, cross-pass invariants are checked:
//! the root's parameter fields and every module's origin must be identical
//! across all resolutions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use rayon::prelude::*;
use thiserror::Error;

use crate::build::finalizer::{finalize_root, FinalizeError};
use crate::build::module::BuildRoot;
use crate::dsl::ast::Program;
use crate::engine::construct::root_fields;
use crate::engine::context::ExecutionContext;
use crate::engine::exec::ExecError;
use crate::engine::types::Architecture;

/// One (configuration, architecture) pair a root was resolved under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolutionKey {
    pub configuration: String,
    pub architecture: Architecture,
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.configuration, self.architecture)
    }
}

/// A cross-pass resolution failure.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    #[error(
        "root '{root}' has no canonical '{field}' field: every resolution under every \
         build parameter pair must produce the same exact value sequence"
    )]
    DivergentRootField { root: String, field: &'static str },

    #[error(
        "module '{module}' of root '{root}' resolves to different origin paths \
         ('{first}' vs '{second}') under different build parameters; a module's \
         declared filesystem origin must be parameter-invariant"
    )]
    DivergentModuleOrigin {
        module: String,
        root: String,
        first: String,
        second: String,
    },
}

/// Resolve `root_name` once per (configuration, architecture) pair and check
/// the cross-resolution invariants.
///
/// `program` must be the pristine, unvisited AST of the root description
/// file; `canonical` is the context of an already completed canonical pass
/// (it supplies the file path, base build order, and the configuration list).
pub fn resolve_for_all(
    program: &Program,
    canonical: &ExecutionContext,
    root_name: &str,
) -> Result<BTreeMap<ResolutionKey, BuildRoot>, ResolveError> {
    let root = canonical
        .roots
        .get(root_name)
        .ok_or(FinalizeError::UnknownRoot {
            name: root_name.to_string(),
        })?;
    let configurations = root
        .construct
        .arr_of(root_fields::CONFIGURATIONS)
        .map_err(FinalizeError::Field)?
        .to_vec();

    let mut keys = Vec::new();
    for configuration in &configurations {
        for architecture in Architecture::ALL {
            let key = ResolutionKey {
                configuration: configuration.clone(),
                architecture: *architecture,
            };
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    tracing::debug!(
        root = root_name,
        passes = keys.len(),
        "resolving all build parameter pairs"
    );

    let resolutions: Result<Vec<(ResolutionKey, BuildRoot)>, ResolveError> = keys
        .par_iter()
        .map(|key| {
            let mut pass_program = program.clone();
            let order = canonical
                .order
                .clone()
                .with_configuration(&key.configuration)
                .with_architecture(key.architecture);
            let mut ctx = ExecutionContext::new(canonical.filepath.clone(), order);
            ctx.visit_program(&mut pass_program)?;
            let built = finalize_root(&ctx, root_name)?;
            Ok((key.clone(), built))
        })
        .collect();

    let all: BTreeMap<ResolutionKey, BuildRoot> = resolutions?.into_iter().collect();

    // Every resolution must agree on the root's parameter fields, and every
    // module's origin must be the same everywhere it appears.
    let mut reference: Option<&BuildRoot> = None;
    let mut origins: BTreeMap<String, PathBuf> = BTreeMap::new();
    for built in all.values() {
        match reference {
            None => reference = Some(built),
            Some(reference) => {
                if built.configurations != reference.configurations {
                    return Err(ResolveError::DivergentRootField {
                        root: root_name.to_string(),
                        field: root_fields::CONFIGURATIONS,
                    });
                }
                if built.architectures != reference.architectures {
                    return Err(ResolveError::DivergentRootField {
                        root: root_name.to_string(),
                        field: root_fields::ARCHITECTURES,
                    });
                }
                if built.platforms != reference.platforms {
                    return Err(ResolveError::DivergentRootField {
                        root: root_name.to_string(),
                        field: root_fields::PLATFORMS,
                    });
                }
            }
        }

        for (name, module) in &built.modules {
            match origins.get(name) {
                Some(existing) if existing != &module.module_path => {
                    return Err(ResolveError::DivergentModuleOrigin {
                        module: name.clone(),
                        root: root_name.to_string(),
                        first: existing.display().to_string(),
                        second: module.module_path.display().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    origins.insert(name.clone(), module.module_path.clone());
                }
            }
        }
    }

    Ok(all)
}
