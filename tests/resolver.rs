// tests/resolver.rs

mod common;
use crate::common::{TestLoader, no_deps};

use std::collections::{BTreeMap, BTreeSet};

use modloader::dag::{DagGraph, can_run, classify_blockage, skipped_jobs, startup_order};
use modloader::engine::ModuleTable;
use modloader::registry::FactoryRegistry;
use modloader::{Factory, LoaderError};

fn stub(name: &str, deps: &[&str]) -> Factory<String> {
    let value = name.to_string();
    Factory::new(name, deps.iter().copied(), move |_| Ok(value.clone()))
}

fn registry(entries: Vec<Factory<String>>) -> FactoryRegistry<String> {
    let mut registry = FactoryRegistry::new();
    for factory in entries {
        registry.insert(factory);
    }
    registry
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn startup_order_respects_dependencies() {
    let reg = registry(vec![
        stub("app", &["web", "db"]),
        stub("web", &["core"]),
        stub("db", &["core"]),
        stub("core", &[]),
    ]);

    let order = startup_order(&DagGraph::from_registry(&reg)).unwrap();
    let pos = |n: &str| order.iter().position(|o| o == n).unwrap();

    assert_eq!(order.len(), 4);
    assert!(pos("core") < pos("web"));
    assert!(pos("core") < pos("db"));
    assert!(pos("web") < pos("app"));
    assert!(pos("db") < pos("app"));
}

#[test]
fn startup_order_rejects_unexcused_missing_dependency() {
    let reg = registry(vec![stub("a", &["ghost"])]);

    match startup_order(&DagGraph::from_registry(&reg)) {
        Err(LoaderError::MissingDependency {
            dependency,
            required_by,
        }) => {
            assert_eq!(dependency, "ghost");
            assert_eq!(required_by, "a");
        }
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[test]
fn startup_order_skips_excused_missing_dependency() {
    let reg = registry(vec![
        stub("a", &["ghost", "b"]).ignore_missing_dependencies(true),
        stub("b", &[]),
    ]);

    let order = startup_order(&DagGraph::from_registry(&reg)).unwrap();
    assert_eq!(order, vec!["b", "a"]);
}

#[test]
fn startup_order_detects_cycles() {
    let reg = registry(vec![stub("a", &["b"]), stub("b", &["a"]), stub("c", &[])]);

    match startup_order(&DagGraph::from_registry(&reg)) {
        Err(LoaderError::DependencyCycle(name)) => {
            assert!(name == "a" || name == "b", "unexpected witness {name}");
        }
        other => panic!("expected DependencyCycle, got {other:?}"),
    }
}

#[test]
fn loader_exposes_startup_order() {
    let mut loader = TestLoader::default();
    loader.register("web", ["core"], |_| Ok("web".to_string())).unwrap();
    loader.register("core", no_deps(), |_| Ok("core".to_string())).unwrap();

    assert_eq!(loader.startup_order().unwrap(), vec!["core", "web"]);
}

#[test]
fn graph_tracks_dependents_and_roots() {
    let reg = registry(vec![
        stub("app", &["web"]),
        stub("web", &["core"]),
        stub("admin", &["core"]),
        stub("core", &[]),
        stub("clock", &[]),
    ]);
    let graph = DagGraph::from_registry(&reg);

    assert_eq!(graph.len(), 5);
    assert_eq!(graph.roots(), vec!["clock", "core"]);
    assert_eq!(graph.dependencies_of("web"), ["core".to_string()]);
    assert_eq!(graph.dependents_of("core"), ["admin".to_string(), "web".to_string()]);
    assert_eq!(graph.transitive_dependents("core"), names(&["admin", "app", "web"]));
    assert!(graph.transitive_dependents("app").is_empty());
    assert!(graph.dependents_of("ghost").is_empty());
}

#[test]
fn can_run_checks_started_and_excused_dependencies() {
    let reg = registry(vec![
        stub("free", &[]),
        stub("needs_core", &["core"]),
        stub("needs_ghost", &["ghost"]),
        stub("optional_ghost", &["ghost"]).ignore_missing_dependencies(true),
        stub("optional_core", &["core"]).ignore_missing_dependencies(true),
        stub("core", &[]),
    ]);
    let modules: ModuleTable<String> = ModuleTable::new();
    let runnable = |name: &str| can_run(reg.get(name).unwrap(), &reg, &modules);

    assert!(runnable("free"));
    assert!(!runnable("needs_core"));
    assert!(!runnable("needs_ghost"));
    assert!(runnable("optional_ghost"));
    assert!(!runnable("optional_core"), "registered deps are never excused");
}

#[test]
fn classify_blockage_collects_missing_cycle_and_unloaded() {
    let reg = registry(vec![
        stub("a", &["b"]),
        stub("b", &["a"]),
        stub("c", &["ghost", "a"]),
        stub("d", &["ghost"]),
        stub("e", &["phantom"]).ignore_missing_dependencies(true),
    ]);
    let modules: ModuleTable<String> = ModuleTable::new();
    let jobs = names(&["a", "b", "c", "d"]);
    let mut failed = BTreeMap::new();
    failed.insert("x".to_string(), "broken".to_string());

    let classification = classify_blockage(&jobs, &reg, &modules, &failed);

    assert_eq!(classification.cycle.as_deref(), Some("a"));
    assert_eq!(classification.cycle_path, vec!["a", "b", "a"]);
    assert_eq!(classification.failed, failed);
    assert_eq!(classification.missing.len(), 1);
    assert_eq!(classification.missing["ghost"], names(&["c", "d"]));
    assert_eq!(
        classification.unloaded.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["b", "c", "d"]
    );
    assert_eq!(classification.unloaded["c"], vec!["ghost", "a"]);
    assert_eq!(classification.blocked_by["b"], names(&["a"]));
    assert_eq!(classification.blocked_by["c"], names(&["a", "ghost"]));
    assert_eq!(classification.blocked_by["d"], names(&["ghost"]));
    assert!(!classification.is_empty());
}

#[test]
fn classify_blockage_of_nothing_is_empty() {
    let reg = registry(vec![stub("a", &[])]);
    let modules: ModuleTable<String> = ModuleTable::new();

    let classification = classify_blockage(&BTreeSet::new(), &reg, &modules, &BTreeMap::new());

    assert!(classification.is_empty());
    assert!(classification.cycle_path.is_empty());
}

#[test]
fn registry_replaces_same_name() {
    let mut reg: FactoryRegistry<String> = FactoryRegistry::new();
    assert_eq!(reg.insert(stub("a", &[])), modloader::Registration::New);
    assert_eq!(reg.insert(stub("a", &["b"])), modloader::Registration::Replaced);

    assert_eq!(reg.len(), 1);
    assert_eq!(reg.get("a").unwrap().dependencies(), ["b".to_string()]);
    assert_eq!(reg.names().collect::<Vec<_>>(), vec!["a"]);
}

#[test]
fn depth_is_longest_path_to_a_root() {
    let reg = registry(vec![
        stub("app", &["web", "core"]),
        stub("web", &["db"]),
        stub("db", &["core"]),
        stub("core", &[]),
        stub("lazy", &["ghost"]).ignore_missing_dependencies(true),
    ]);
    let graph = DagGraph::from_registry(&reg);

    assert_eq!(graph.depth_of("core"), Some(0));
    assert_eq!(graph.depth_of("lazy"), Some(0));
    assert_eq!(graph.depth_of("db"), Some(1));
    assert_eq!(graph.depth_of("web"), Some(2));
    assert_eq!(graph.depth_of("app"), Some(3));
    assert_eq!(graph.depth_of("ghost"), None);
    assert_eq!(graph.ordered(), vec!["core", "lazy", "db", "web", "app"]);
}

#[test]
fn depth_terminates_on_cycles() {
    let reg = registry(vec![stub("a", &["b"]), stub("b", &["a"]), stub("c", &["a"])]);
    let graph = DagGraph::from_registry(&reg);

    assert_eq!(graph.ordered().len(), 3);
    assert!(graph.depth_of("c").unwrap() > graph.depth_of("a").unwrap());
}

#[test]
fn startup_order_uses_depth_then_name() {
    let reg = registry(vec![stub("b", &["a"]), stub("a", &[]), stub("c", &[]), stub("d", &["c"])]);

    let order = startup_order(&DagGraph::from_registry(&reg)).unwrap();
    assert_eq!(order, vec!["a", "c", "b", "d"]);
}

#[test]
fn skipped_jobs_follow_non_installable_modules() {
    let reg = registry(vec![
        stub("legacy", &[]).installable(false),
        stub("bridge", &["legacy"]),
        stub("ui", &["bridge"]),
        stub("core", &[]),
    ]);
    let graph = DagGraph::from_registry(&reg);

    let skipped = skipped_jobs(&names(&["legacy", "bridge", "ui", "core"]), &graph);

    assert_eq!(skipped.len(), 3);
    assert_eq!(skipped["legacy"], "legacy");
    assert_eq!(skipped["bridge"], "legacy");
    assert_eq!(skipped["ui"], "legacy");
    assert!(!graph.is_installable("legacy"));
    assert!(graph.is_installable("core"));
}

#[test]
fn startup_order_leaves_out_skipped_modules() {
    let reg = registry(vec![
        stub("legacy", &["ghost"]).installable(false),
        stub("bridge", &["legacy"]),
        stub("core", &[]),
    ]);

    let order = startup_order(&DagGraph::from_registry(&reg)).unwrap();
    assert_eq!(order, vec!["core"]);
}
