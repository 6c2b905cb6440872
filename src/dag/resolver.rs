// src/dag/resolver.rs

//! Dependency resolution over the factory registry.
//!
//! - [`can_run`] decides whether a pending job may be instantiated now.
//! - [`startup_order`] computes a full valid order up front (used for
//!   dry-runs and diagnostics; the loader itself works pass by pass).
//! - [`skipped_jobs`] finds jobs that will never be started because they,
//!   or something they depend on, are not installable.
//! - [`classify_blockage`] explains why the remaining jobs could not run
//!   once a pass makes no progress.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::dag::graph::DagGraph;
use crate::engine::ModuleTable;
use crate::errors::{LoaderError, Result};
use crate::registry::{Factory, FactoryRegistry};
use crate::types::ModuleName;

/// Why the loader could not resolve every job.
///
/// Produced only when a pass settles with pending jobs or failed factories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorClassification {
    /// One module that sits on a dependency cycle, if any.
    pub cycle: Option<ModuleName>,
    /// The cycle walked from the witness back to itself (`[a, b, a]`).
    pub cycle_path: Vec<ModuleName>,
    /// Factories that returned an error or panicked, with the message.
    pub failed: BTreeMap<ModuleName, String>,
    /// Unregistered dependency names, each with the jobs that need it.
    pub missing: BTreeMap<ModuleName, BTreeSet<ModuleName>>,
    /// Blocked jobs, each with the dependencies it is still waiting on.
    pub unloaded: BTreeMap<ModuleName, Vec<ModuleName>>,
    /// Blocked jobs, each with the root causes it sits downstream of: missing
    /// names, failed modules and the cycle witness.
    pub blocked_by: BTreeMap<ModuleName, BTreeSet<ModuleName>>,
}

impl ErrorClassification {
    pub fn is_empty(&self) -> bool {
        self.cycle.is_none()
            && self.failed.is_empty()
            && self.missing.is_empty()
            && self.unloaded.is_empty()
    }
}

/// `dep` is never going to show up and `factory` has opted out of waiting for it.
fn is_excused<T>(factory: &Factory<T>, dep: &str, registry: &FactoryRegistry<T>) -> bool {
    factory.ignores_missing_dependencies() && !registry.contains(dep)
}

/// Whether every dependency of `factory` is started or excused.
pub fn can_run<T>(
    factory: &Factory<T>,
    registry: &FactoryRegistry<T>,
    modules: &ModuleTable<T>,
) -> bool {
    factory
        .dependencies()
        .iter()
        .all(|dep| modules.contains(dep) || is_excused(factory, dep, registry))
}

/// Dependencies of `factory` that currently block it, in declaration order.
pub fn waiting_on<T>(
    factory: &Factory<T>,
    registry: &FactoryRegistry<T>,
    modules: &ModuleTable<T>,
) -> Vec<ModuleName> {
    let mut out: Vec<ModuleName> = Vec::new();
    for dep in factory.dependencies() {
        if modules.contains(dep) || is_excused(factory, dep, registry) {
            continue;
        }
        if !out.contains(dep) {
            out.push(dep.clone());
        }
    }
    out
}

/// Compute the order a clean boot starts modules in.
///
/// Modules are ordered by `(depth, name)`, the same order the loader walks
/// its pending jobs in. Non-installable modules and their dependents are
/// left out, and excused missing dependencies are skipped. A missing
/// dependency that is not excused, or a cycle, means no valid order exists.
pub fn startup_order(graph: &DagGraph) -> Result<Vec<ModuleName>> {
    let all: BTreeSet<ModuleName> = graph.modules().map(str::to_string).collect();
    let skipped = skipped_jobs(&all, graph);

    // Edge direction: dep -> module.
    let mut dag: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in graph.modules().filter(|n| !skipped.contains_key(*n)) {
        dag.add_node(name);
    }

    for name in graph.modules().filter(|n| !skipped.contains_key(*n)) {
        for dep in graph.dependencies_of(name) {
            if graph.contains(dep) {
                dag.add_edge(dep.as_str(), name, ());
            } else if !graph.ignores_missing(name) {
                return Err(LoaderError::MissingDependency {
                    dependency: dep.clone(),
                    required_by: name.to_string(),
                });
            }
        }
    }

    // A topological sort will fail if there is a cycle.
    if let Err(cycle) = toposort(&dag, None) {
        return Err(LoaderError::DependencyCycle(cycle.node_id().to_string()));
    }

    Ok(graph
        .ordered()
        .into_iter()
        .filter(|name| !skipped.contains_key(*name))
        .map(str::to_string)
        .collect())
}

/// Jobs that must not be started, each mapped to the non-installable module
/// responsible.
///
/// A non-installable job maps to itself. Every job that depends on one,
/// directly or not, maps to the first such module in name order.
pub fn skipped_jobs(
    jobs: &BTreeSet<ModuleName>,
    graph: &DagGraph,
) -> BTreeMap<ModuleName, ModuleName> {
    let mut skipped: BTreeMap<ModuleName, ModuleName> = BTreeMap::new();

    let roots: Vec<&ModuleName> = jobs
        .iter()
        .filter(|job| graph.contains(job) && !graph.is_installable(job))
        .collect();

    for root in &roots {
        skipped.insert((*root).clone(), (*root).clone());
    }
    for root in roots {
        for dependent in graph.transitive_dependents(root) {
            if jobs.contains(&dependent) {
                skipped.entry(dependent).or_insert_with(|| root.clone());
            }
        }
    }

    skipped
}

/// Explain why `jobs` are stuck.
///
/// `failed` is copied through unchanged; the scheduler owns it.
pub fn classify_blockage<T>(
    jobs: &BTreeSet<ModuleName>,
    registry: &FactoryRegistry<T>,
    modules: &ModuleTable<T>,
    failed: &BTreeMap<ModuleName, String>,
) -> ErrorClassification {
    let mut missing: BTreeMap<ModuleName, BTreeSet<ModuleName>> = BTreeMap::new();

    for job in jobs {
        let Some(factory) = registry.get(job) else {
            warn!(module = %job, "pending job has no registered factory");
            continue;
        };
        for dep in factory.dependencies() {
            if !registry.contains(dep)
                && !modules.contains(dep)
                && !factory.ignores_missing_dependencies()
            {
                missing
                    .entry(dep.clone())
                    .or_default()
                    .insert(job.clone());
            }
        }
    }

    let cycle_path = find_cycle(jobs, registry);
    let cycle = cycle_path.first().cloned();
    if let Some(ref witness) = cycle {
        debug!(module = %witness, path = ?cycle_path, "dependency cycle among pending jobs");
    }

    let unloaded: BTreeMap<ModuleName, Vec<ModuleName>> = jobs
        .iter()
        .filter(|job| cycle.as_ref() != Some(*job))
        .map(|job| {
            let blockers = registry
                .get(job)
                .map(|factory| waiting_on(factory, registry, modules))
                .unwrap_or_default();
            (job.clone(), blockers)
        })
        .collect();

    let blocked_by = blast_radius(&unloaded, &missing, failed, cycle.as_deref(), registry);

    ErrorClassification {
        cycle,
        cycle_path,
        failed: failed.clone(),
        missing,
        unloaded,
        blocked_by,
    }
}

/// Attribute every unloaded job to the root causes upstream of it.
///
/// A job stuck behind a second, unreported cycle may end up with no root.
fn blast_radius<T>(
    unloaded: &BTreeMap<ModuleName, Vec<ModuleName>>,
    missing: &BTreeMap<ModuleName, BTreeSet<ModuleName>>,
    failed: &BTreeMap<ModuleName, String>,
    cycle: Option<&str>,
    registry: &FactoryRegistry<T>,
) -> BTreeMap<ModuleName, BTreeSet<ModuleName>> {
    let graph = DagGraph::from_registry(registry);
    let mut blocked_by: BTreeMap<ModuleName, BTreeSet<ModuleName>> = unloaded
        .keys()
        .map(|job| (job.clone(), BTreeSet::new()))
        .collect();

    let mut attribute = |root: &str, affected: BTreeSet<ModuleName>| {
        for job in affected {
            if let Some(roots) = blocked_by.get_mut(&job) {
                roots.insert(root.to_string());
            }
        }
    };

    // A missing name is not in the graph; start from the jobs that need it.
    for (name, required_by) in missing {
        let mut affected = required_by.clone();
        for job in required_by {
            affected.extend(graph.transitive_dependents(job));
        }
        attribute(name.as_str(), affected);
    }

    for name in failed.keys() {
        attribute(name.as_str(), graph.transitive_dependents(name));
    }

    if let Some(witness) = cycle {
        attribute(witness, graph.transitive_dependents(witness));
    }

    blocked_by
}

/// Depth-first search for a cycle among pending jobs.
///
/// Starts from each job in sorted order and follows dependencies in
/// declaration order, so the witness is stable for a given registry.
fn find_cycle<T>(jobs: &BTreeSet<ModuleName>, registry: &FactoryRegistry<T>) -> Vec<ModuleName> {
    let mut done: HashSet<&str> = HashSet::new();

    for start in jobs {
        let mut path: Vec<&str> = Vec::new();
        if let Some(cycle) = walk(start, jobs, registry, &mut path, &mut done) {
            return cycle;
        }
    }

    Vec::new()
}

fn walk<'a, T>(
    name: &'a str,
    jobs: &'a BTreeSet<ModuleName>,
    registry: &'a FactoryRegistry<T>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Option<Vec<ModuleName>> {
    if let Some(pos) = path.iter().position(|n| *n == name) {
        let mut cycle: Vec<ModuleName> = path[pos..].iter().map(|s| s.to_string()).collect();
        cycle.push(name.to_string());
        return Some(cycle);
    }
    if done.contains(name) {
        return None;
    }

    path.push(name);
    if let Some(factory) = registry.get(name) {
        for dep in factory.dependencies() {
            if !jobs.contains(dep) {
                continue;
            }
            if let Some(cycle) = walk(dep.as_str(), jobs, registry, path, done) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    done.insert(name);

    None
}
