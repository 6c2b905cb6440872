// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::registry::FactoryRegistry;
use crate::types::ModuleName;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    /// Direct dependencies: modules that must be started before this one.
    deps: Vec<ModuleName>,
    /// Direct dependents: registered modules that list this one as a dependency.
    dependents: Vec<ModuleName>,
    /// Whether unregistered dependencies are excused for this module.
    ignore_missing: bool,
    /// Whether the module may be started at all.
    installable: bool,
    /// Longest distance to a root along registered dependencies.
    depth: usize,
}

/// Adjacency view of the factory registry keyed by module name.
///
/// Unlike the registry itself this is a snapshot: it does not hold the
/// factory functions and is not updated by later registrations. Nothing
/// here assumes the graph is acyclic or that every dependency is
/// registered; [`crate::dag::resolver`] decides what to do about either.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: BTreeMap<ModuleName, DagNode>,
}

impl DagGraph {
    /// Build a graph from every factory currently registered.
    pub fn from_registry<T>(registry: &FactoryRegistry<T>) -> Self {
        let mut nodes: BTreeMap<ModuleName, DagNode> = BTreeMap::new();

        // First pass: create nodes with their dependency lists.
        for factory in registry.iter() {
            nodes.insert(
                factory.name().to_string(),
                DagNode {
                    deps: factory.dependencies().to_vec(),
                    dependents: Vec::new(),
                    ignore_missing: factory.ignores_missing_dependencies(),
                    installable: factory.is_installable(),
                    depth: 0,
                },
            );
        }

        // Second pass: populate dependents based on deps.
        let names: Vec<ModuleName> = nodes.keys().cloned().collect();
        for name in names {
            let deps = nodes
                .get(&name)
                .map(|n| n.deps.clone())
                .unwrap_or_default();

            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    if !dep_node.dependents.contains(&name) {
                        dep_node.dependents.push(name.clone());
                    }
                }
            }
        }

        // Third pass: depths. Names are visited in sorted order, so the
        // depths assigned on a cycle are stable for a given registry.
        let mut depths: BTreeMap<ModuleName, usize> = BTreeMap::new();
        let mut visiting: BTreeSet<ModuleName> = BTreeSet::new();
        for name in nodes.keys() {
            compute_depth(name, &nodes, &mut depths, &mut visiting);
        }
        for (name, depth) in depths {
            if let Some(node) = nodes.get_mut(&name) {
                node.depth = depth;
            }
        }

        Self { nodes }
    }

    /// All module names, sorted.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate dependencies of a module, in declaration order.
    pub fn dependencies_of(&self, name: &str) -> &[ModuleName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a module (modules that list this one as a dependency).
    pub fn dependents_of(&self, name: &str) -> &[ModuleName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    pub fn ignores_missing(&self, name: &str) -> bool {
        self.nodes.get(name).is_some_and(|n| n.ignore_missing)
    }

    pub fn is_installable(&self, name: &str) -> bool {
        self.nodes.get(name).is_some_and(|n| n.installable)
    }

    /// Longest path from `name` down to a root, counting registered
    /// dependencies only. Roots have depth 0.
    pub fn depth_of(&self, name: &str) -> Option<usize> {
        self.nodes.get(name).map(|n| n.depth)
    }

    /// Every module ordered by `(depth, name)`.
    ///
    /// On an acyclic graph each module comes after all of its registered
    /// dependencies, so this is both the planned startup order and the order
    /// the loader walks pending jobs in.
    pub fn ordered(&self) -> Vec<&str> {
        let mut names: Vec<(usize, &str)> = self
            .nodes
            .iter()
            .map(|(name, node)| (node.depth, name.as_str()))
            .collect();
        names.sort_unstable();
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// Modules that declare no dependencies at all.
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.deps.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Every module that depends on `name`, directly or indirectly.
    ///
    /// `name` itself is only included if it sits on a cycle.
    pub fn transitive_dependents(&self, name: &str) -> BTreeSet<ModuleName> {
        let mut stack: Vec<&str> = self.dependents_of(name).iter().map(|s| s.as_str()).collect();
        let mut seen: BTreeSet<ModuleName> = BTreeSet::new();

        while let Some(current) = stack.pop() {
            if !seen.insert(current.to_string()) {
                continue;
            }
            stack.extend(self.dependents_of(current).iter().map(|s| s.as_str()));
        }

        seen
    }
}

fn compute_depth(
    name: &str,
    nodes: &BTreeMap<ModuleName, DagNode>,
    depths: &mut BTreeMap<ModuleName, usize>,
    visiting: &mut BTreeSet<ModuleName>,
) -> usize {
    if let Some(depth) = depths.get(name) {
        return *depth;
    }
    // Back edge: `name` is on a cycle that is still being walked.
    if !visiting.insert(name.to_string()) {
        return 0;
    }

    let mut depth = 0;
    if let Some(node) = nodes.get(name) {
        for dep in node.deps.iter().filter(|d| nodes.contains_key(d.as_str())) {
            depth = depth.max(compute_depth(dep, nodes, depths, visiting) + 1);
        }
    }

    visiting.remove(name);
    depths.insert(name.to_string(), depth);
    depth
}
