use std::collections::{BTreeMap, BTreeSet};

use modloader::config::Manifest;
use modloader::{ModuleLoader, register_manifest};
use modloader_test_utils::builders::{ManifestBuilder, ModuleSpecBuilder};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Started,
    Failed,
    Pending,
    Skipped,
}

#[derive(Debug, Clone)]
struct Case {
    manifest: Manifest,
    // Declared dependencies by module index, ghost names excluded.
    deps: Vec<BTreeSet<usize>>,
    ghosted: BTreeSet<usize>,
    failing: BTreeSet<usize>,
    uninstallable: BTreeSet<usize>,
}

fn name(i: usize) -> String {
    format!("mod_{i:02}")
}

// Acyclic by construction: module N only depends on modules 0..N-1.
// Some modules also name an unregistered dependency, some fail and some
// are not installable.
fn case_strategy(max_modules: usize) -> impl Strategy<Value = Case> {
    (1..=max_modules).prop_flat_map(|count| {
        (
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), count),
            proptest::collection::btree_set(0..count, 0..=count.min(3)),
            proptest::collection::btree_set(0..count, 0..=count.min(3)),
            proptest::collection::btree_set(0..count, 0..=count.min(2)),
        )
            .prop_map(move |(raw_deps, ghosted, failing, uninstallable)| {
                let mut builder = ManifestBuilder::new();
                let mut deps = Vec::with_capacity(count);

                for (i, potential) in raw_deps.into_iter().enumerate() {
                    let valid: BTreeSet<usize> = if i == 0 {
                        BTreeSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    };

                    let mut spec = ModuleSpecBuilder::new();
                    for dep in &valid {
                        spec = spec.after(&name(*dep));
                    }
                    if ghosted.contains(&i) {
                        spec = spec.after("ghost");
                    }
                    if failing.contains(&i) {
                        spec = spec.fail("injected failure");
                    }
                    if uninstallable.contains(&i) {
                        spec = spec.installable(false);
                    }

                    builder = builder.with_module(&name(i), spec.build());
                    deps.push(valid);
                }

                Case {
                    manifest: builder.build(),
                    deps,
                    ghosted,
                    failing,
                    uninstallable,
                }
            })
    })
}

fn expected_statuses(case: &Case) -> Vec<Status> {
    let mut statuses: Vec<Status> = Vec::with_capacity(case.deps.len());
    for (i, deps) in case.deps.iter().enumerate() {
        let skipped = case.uninstallable.contains(&i)
            || deps.iter().any(|d| statuses[*d] == Status::Skipped);
        if skipped {
            statuses.push(Status::Skipped);
            continue;
        }
        let blocked = case.ghosted.contains(&i)
            || deps.iter().any(|d| statuses[*d] != Status::Started);
        let status = if blocked {
            Status::Pending
        } else if case.failing.contains(&i) {
            Status::Failed
        } else {
            Status::Started
        };
        statuses.push(status);
    }
    statuses
}

proptest! {
    #[test]
    fn dependencies_start_before_dependents(case in case_strategy(12)) {
        let mut loader: ModuleLoader<String> = ModuleLoader::default();
        register_manifest(&mut loader, &case.manifest).unwrap();
        loader.start();

        for (i, deps) in case.deps.iter().enumerate() {
            let Some(module) = loader.module(&name(i)) else { continue };
            for dep in deps {
                let dep_module = loader.module(&name(*dep));
                prop_assert!(dep_module.is_some(), "{} started without {}", name(i), name(*dep));
                prop_assert!(dep_module.unwrap().start_index() < module.start_index());
            }
        }
    }

    #[test]
    fn every_name_is_started_failed_pending_or_skipped(case in case_strategy(12)) {
        let mut loader: ModuleLoader<String> = ModuleLoader::default();
        register_manifest(&mut loader, &case.manifest).unwrap();
        let summary = loader.start();

        let started: BTreeSet<String> = loader.modules().map(|m| m.name().to_string()).collect();
        let failed: BTreeMap<String, String> = loader
            .failed()
            .map(|(n, e)| (n.to_string(), e.to_string()))
            .collect();
        let pending: BTreeSet<String> = loader.pending_jobs().map(str::to_string).collect();
        let skipped: BTreeSet<String> = loader.skipped().map(|(n, _)| n.to_string()).collect();

        for registered in loader.registry().names() {
            let memberships = [
                started.contains(registered),
                failed.contains_key(registered),
                pending.contains(registered),
                skipped.contains(registered),
            ]
            .iter()
            .filter(|&&hit| hit)
            .count();
            prop_assert_eq!(memberships, 1, "{} is in {} sets", registered, memberships);
        }

        let expected = expected_statuses(&case);
        for (i, status) in expected.iter().enumerate() {
            let n = name(i);
            let actual = if started.contains(&n) {
                Status::Started
            } else if failed.contains_key(&n) {
                Status::Failed
            } else if skipped.contains(&n) {
                Status::Skipped
            } else {
                Status::Pending
            };
            prop_assert_eq!(actual, *status, "status of {}", n);
        }

        let clean = expected
            .iter()
            .all(|s| matches!(s, Status::Started | Status::Skipped));
        prop_assert_eq!(summary.is_ok(), clean);
    }

    #[test]
    fn clean_boot_follows_planned_order(case in case_strategy(12)) {
        let mut loader: ModuleLoader<String> = ModuleLoader::default();
        register_manifest(&mut loader, &case.manifest).unwrap();
        let planned = loader.startup_order();
        let summary = loader.start();

        // The planned order does not know which factories will fail.
        if let Ok(planned) = planned {
            if summary.is_ok() {
                prop_assert_eq!(planned, summary.started);
            } else {
                prop_assert!(!case.failing.is_empty());
            }
        }
    }

    #[test]
    fn restarting_without_changes_is_stable(case in case_strategy(8)) {
        let mut loader: ModuleLoader<String> = ModuleLoader::default();
        register_manifest(&mut loader, &case.manifest).unwrap();
        let first = loader.start();
        let second = loader.start();

        prop_assert!(second.started.is_empty());
        prop_assert_eq!(first.report, second.report);
    }
}
