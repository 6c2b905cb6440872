// src/lib.rs

//! Dependency-ordered module loader.
//!
//! Named factories declare the modules they depend on. A
//! [`ModuleLoader`] instantiates them in dependency order, isolates
//! factories that fail, and reports cycles, missing dependencies and their
//! blast radius as a [`BootReport`] instead of aborting the host.
//!
//! ```
//! use modloader::ModuleLoader;
//!
//! let mut loader: ModuleLoader<String> = ModuleLoader::default();
//! loader
//!     .register("web", ["core"], |deps| {
//!         let core = deps.module("core")?;
//!         Ok(format!("web on {core}"))
//!     })
//!     .unwrap();
//! loader
//!     .register("core", Vec::<String>::new(), |_| Ok("core".to_string()))
//!     .unwrap();
//!
//! let summary = loader.start();
//! assert!(summary.is_ok());
//! assert_eq!(loader.get("web").map(String::as_str), Some("web on core"));
//! ```

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod registry;
pub mod report;
pub mod types;

use anyhow::{Result, bail};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::Manifest;

pub use crate::engine::{LoaderEvent, LoaderState, ModuleLoader, PassSummary, Require};
pub use crate::errors::LoaderError;
pub use crate::registry::{Factory, Registration};
pub use crate::report::BootReport;
pub use crate::types::{AnyModule, ModuleName, ReportFormat, ReregistrationPolicy};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading
/// - stub factory registration
/// - one boot via [`ModuleLoader::start`]
/// - progress + report output
pub fn run(args: CliArgs) -> Result<()> {
    let manifest = load_and_validate(&args.manifest)?;

    if args.dry_run {
        print_dry_run(&manifest);
        return Ok(());
    }

    let mut loader: ModuleLoader<String> = ModuleLoader::new(manifest.loader.clone());
    register_manifest(&mut loader, &manifest)?;

    let mut events = loader.subscribe();
    let summary = loader.start();

    loop {
        match events.try_recv() {
            Ok(LoaderEvent::ModuleStarted {
                name,
                started,
                total,
            }) => {
                info!(module = %name, "[{started}/{total}] module started");
            }
            Ok(LoaderEvent::SettledWithErrors(_)) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                debug!(skipped, "progress events dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    match summary.report {
        None => {
            match args.format {
                ReportFormat::Text => print!("{}", BootReport::default()),
                ReportFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&BootReport::default())?)
                }
            }
            Ok(())
        }
        Some(report) => {
            match args.format {
                ReportFormat::Text => print!("{report}"),
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
            if args.allow_errors {
                Ok(())
            } else {
                bail!(
                    "{} of {} modules could not be started",
                    report.affected_modules().len(),
                    manifest.module.len()
                )
            }
        }
    }
}

/// Register one stub factory per manifest entry.
///
/// Each stub resolves its declared dependencies through [`Require`] and
/// produces a string such as `web[core, db]`; absent optional dependencies
/// are rendered as `name?`. A `fail` message makes the stub return an error.
pub fn register_manifest(
    loader: &mut ModuleLoader<String>,
    manifest: &Manifest,
) -> errors::Result<()> {
    for (name, spec) in manifest.module.iter() {
        let module = name.clone();
        let deps = spec.dependencies.clone();
        let fail = spec.fail.clone();

        let factory = Factory::new(
            name.clone(),
            spec.dependencies.clone(),
            move |require: &Require<'_, String>| {
                if let Some(ref message) = fail {
                    bail!("{message}");
                }

                let mut resolved = Vec::with_capacity(deps.len());
                for dep in &deps {
                    match require.require(dep)? {
                        Some(_) => resolved.push(dep.clone()),
                        None => resolved.push(format!("{dep}?")),
                    }
                }

                Ok(format!("{module}[{}]", resolved.join(", ")))
            },
        )
        .ignore_missing_dependencies(spec.ignore_missing_dependencies)
        .installable(spec.installable);

        loader.register_factory(factory)?;
    }

    Ok(())
}

/// Simple dry-run output: print modules, deps and the planned startup order.
fn print_dry_run(manifest: &Manifest) {
    println!("modloader dry-run");
    println!(
        "  loader.reregistration = {:?}",
        manifest.loader.reregistration
    );
    println!("  loader.event_capacity = {}", manifest.loader.event_capacity);
    println!("  loader.catch_panics = {}", manifest.loader.catch_panics);
    println!();

    println!("modules ({}):", manifest.module.len());
    for (name, spec) in manifest.module.iter() {
        println!("  - {name}");
        if !spec.dependencies.is_empty() {
            println!("      dependencies: {:?}", spec.dependencies);
        }
        if spec.ignore_missing_dependencies {
            println!("      ignore_missing_dependencies: true");
        }
        if !spec.installable {
            println!("      installable: false");
        }
        if let Some(ref message) = spec.fail {
            println!("      fail: {message}");
        }
    }
    println!();

    let mut loader: ModuleLoader<String> = ModuleLoader::new(manifest.loader.clone());
    if let Err(e) = register_manifest(&mut loader, manifest) {
        println!("registration failed: {e}");
        return;
    }

    let graph = loader.graph();
    println!("roots: {}", graph.roots().join(", "));

    match loader.startup_order() {
        Ok(order) => {
            println!("startup order:");
            for name in &order {
                let depth = graph.depth_of(name).unwrap_or(0);
                println!("  {depth:>2}  {name}");
            }
        }
        Err(e) => println!("no valid startup order: {e}"),
    }

    debug!("dry-run complete (no factories executed)");
}
