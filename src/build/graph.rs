//! Build graph ordering.
//!
//! Topologically sorts a finalized root's modules over their `dependencies`
//! edges (linkages are a subset of dependencies, so they need no separate
//! edges). The finalizer has already rejected user-level cycles; a cycle
//! surfacing here means the finalized graph itself is inconsistent.

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use thiserror::Error;

use crate::build::module::{BuildModule, BuildRoot};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(
        "cycle detected at module '{module}' while ordering the build graph; \
         finalization should have rejected this, so the finalized graph is invalid"
    )]
    CycleDetected { module: String },
}

/// A build-ordered view of a finalized root's modules.
#[derive(Debug, Clone)]
pub struct BuildGraph {
    /// Every module of the root, ordered so that each appears after all of
    /// its dependencies.
    pub modules: Vec<Arc<BuildModule>>,
}

impl BuildGraph {
    pub fn new(root: &BuildRoot) -> Result<Self, GraphError> {
        Ok(BuildGraph {
            modules: Self::topo_sort(&root.modules)?,
        })
    }

    /// Topologically sort a module map, dependencies first.
    pub fn topo_sort(
        modules: &BTreeMap<String, Arc<BuildModule>>,
    ) -> Result<Vec<Arc<BuildModule>>, GraphError> {
        let mut graph = DiGraph::<&str, ()>::new();
        let mut nodes = BTreeMap::new();

        for name in modules.keys() {
            nodes.insert(name.as_str(), graph.add_node(name.as_str()));
        }
        for (name, module) in modules {
            for dependency in module.dependencies.keys() {
                if let (Some(&from), Some(&to)) =
                    (nodes.get(name.as_str()), nodes.get(dependency.as_str()))
                {
                    // Edge direction: dependent -> dependency.
                    graph.add_edge(from, to, ());
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| GraphError::CycleDetected {
            module: graph[cycle.node_id()].to_string(),
        })?;

        // Toposort puts dependents before their dependencies along our edge
        // direction; reverse so dependencies build first.
        Ok(order
            .into_iter()
            .rev()
            .map(|node| modules[graph[node]].clone())
            .collect())
    }
}
