// src/engine/loader.rs

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::LoaderConfig;
use crate::dag::{DagGraph, can_run, classify_blockage, skipped_jobs, startup_order};
use crate::engine::{LoaderEvent, LoaderState, Module, ModuleTable, Require};
use crate::errors::{LoaderError, Result};
use crate::registry::{Factory, FactoryRegistry, Registration};
use crate::report::{BootReport, report};
use crate::types::{AnyModule, ModuleName, ReregistrationPolicy};

/// Outcome of a single [`ModuleLoader::start`] call.
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    /// Modules started by this call, in start order.
    pub started: Vec<ModuleName>,
    /// Factories that failed during this call.
    pub failed: Vec<ModuleName>,
    /// Every module currently skipped as not installable, sorted.
    pub skipped: Vec<ModuleName>,
    /// Present when the loader settled with errors.
    pub report: Option<BootReport>,
}

impl PassSummary {
    pub fn is_ok(&self) -> bool {
        self.report.is_none()
    }

    /// Treat an unresolved boot as fatal.
    pub fn into_result(self) -> Result<Vec<ModuleName>> {
        match self.report {
            None => Ok(self.started),
            Some(report) => Err(LoaderError::Boot(Box::new(report))),
        }
    }
}

/// Dependency-ordered module loader.
///
/// Holds:
/// - the factory registry (grows only)
/// - pending jobs: registered names that have neither started nor failed
/// - the live module table
/// - failed factories and their error messages
/// - skipped modules, each with the non-installable module responsible
///
/// Every registered name is in exactly one of jobs / modules / failed /
/// skipped.
pub struct ModuleLoader<T = AnyModule> {
    config: LoaderConfig,
    registry: FactoryRegistry<T>,
    jobs: BTreeSet<ModuleName>,
    modules: ModuleTable<T>,
    failed: BTreeMap<ModuleName, String>,
    skipped: BTreeMap<ModuleName, ModuleName>,
    state: LoaderState,
    events: broadcast::Sender<LoaderEvent>,
}

impl<T> ModuleLoader<T> {
    pub fn new(config: LoaderConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            registry: FactoryRegistry::new(),
            jobs: BTreeSet::new(),
            modules: ModuleTable::new(),
            failed: BTreeMap::new(),
            skipped: BTreeMap::new(),
            state: LoaderState::Idle,
            events,
        }
    }

    /// Register a factory whose dependencies must all be started first.
    pub fn register<I, F>(
        &mut self,
        name: impl Into<ModuleName>,
        dependencies: I,
        function: F,
    ) -> Result<Registration>
    where
        I: IntoIterator,
        I::Item: Into<ModuleName>,
        F: Fn(&Require<'_, T>) -> anyhow::Result<T> + 'static,
    {
        self.register_factory(Factory::new(name, dependencies, function))
    }

    /// Register a factory that does not wait for unregistered dependencies.
    pub fn register_lazy<I, F>(
        &mut self,
        name: impl Into<ModuleName>,
        dependencies: I,
        function: F,
    ) -> Result<Registration>
    where
        I: IntoIterator,
        I::Item: Into<ModuleName>,
        F: Fn(&Require<'_, T>) -> anyhow::Result<T> + 'static,
    {
        self.register_factory(
            Factory::new(name, dependencies, function).ignore_missing_dependencies(true),
        )
    }

    /// Store `factory` and queue it as a job.
    ///
    /// Duplicate names follow [`LoaderConfig::reregistration`]. A name that
    /// already produced a module is always refused.
    pub fn register_factory(&mut self, factory: Factory<T>) -> Result<Registration> {
        let name = factory.name().to_string();

        if self.modules.contains(&name) {
            warn!(module = %name, "refusing to re-register an already started module");
            return Err(LoaderError::AlreadyStarted(name));
        }

        if self.registry.contains(&name)
            && self.config.reregistration == ReregistrationPolicy::Reject
        {
            warn!(module = %name, "duplicate factory registration rejected");
            return Err(LoaderError::DuplicateFactory(name));
        }

        debug!(
            module = %name,
            deps = ?factory.dependencies(),
            ignore_missing = factory.ignores_missing_dependencies(),
            "registering factory"
        );

        let registration = self.registry.insert(factory);
        if registration == Registration::Replaced {
            let was_failed = self.failed.remove(&name).is_some();
            warn!(
                module = %name,
                was_failed,
                "factory re-registered; previous definition replaced"
            );
        }

        // The new factory may change what is installable; skipped names are
        // recomputed on the next start().
        let unskipped = std::mem::take(&mut self.skipped);
        self.jobs.extend(unskipped.into_keys());

        self.jobs.insert(name);
        Ok(registration)
    }

    /// Run passes until every job is resolved or no further progress is possible.
    ///
    /// Jobs are visited in `(depth, name)` order, so a clean boot starts
    /// modules in [`ModuleLoader::startup_order`]. Factory errors never
    /// escape: they are recorded as failed and the pass carries on with
    /// independent modules. Panics are recorded the same way; with
    /// `catch_panics` off the panic is then resumed.
    pub fn start(&mut self) -> PassSummary {
        if self.jobs.is_empty() && self.failed.is_empty() {
            debug!(
                modules = self.modules.len(),
                "start: nothing pending; loader already settled"
            );
            self.state = LoaderState::SettledOk;
            return PassSummary {
                skipped: self.skipped.keys().cloned().collect(),
                ..PassSummary::default()
            };
        }

        self.state = LoaderState::Running;
        info!(
            pending = self.jobs.len(),
            started = self.modules.len(),
            "module loader: starting"
        );

        let graph = DagGraph::from_registry(&self.registry);
        self.skip_uninstallable(&graph);
        let order: Vec<ModuleName> = graph.ordered().into_iter().map(str::to_string).collect();

        let mut started = Vec::new();
        let mut failed_now = Vec::new();
        let mut pass = 0usize;

        loop {
            pass += 1;
            let mut progress = false;

            // Decide from a snapshot, then mutate.
            let pending: Vec<ModuleName> = order
                .iter()
                .filter(|name| self.jobs.contains(*name))
                .cloned()
                .collect();

            for name in pending {
                let Some(factory) = self.registry.get(&name) else {
                    warn!(module = %name, "job has no registered factory; dropping");
                    self.jobs.remove(&name);
                    continue;
                };

                if !can_run(factory, &self.registry, &self.modules) {
                    continue;
                }

                // The job leaves the queue only once the factory has returned.
                let outcome = instantiate(factory, &self.registry, &self.modules);
                self.jobs.remove(&name);
                progress = true;

                match outcome {
                    Outcome::Started(value) => {
                        let index = self.modules.insert(name.clone(), value);
                        debug!(module = %name, pass, index, "module started");
                        let _ = self.events.send(LoaderEvent::ModuleStarted {
                            name: name.clone(),
                            started: self.modules.len(),
                            total: self.registry.len(),
                        });
                        started.push(name);
                    }
                    Outcome::Failed(message) => {
                        self.record_failure(&graph, &name, message);
                        failed_now.push(name);
                    }
                    Outcome::Panicked(message, payload) => {
                        self.record_failure(&graph, &name, message);
                        if !self.config.catch_panics {
                            self.state = LoaderState::SettledWithErrors;
                            error!(module = %name, "factory panicked; resuming the panic");
                            panic::resume_unwind(payload);
                        }
                        failed_now.push(name);
                    }
                }
            }

            if !progress || self.jobs.is_empty() {
                break;
            }
        }

        let skipped: Vec<ModuleName> = self.skipped.keys().cloned().collect();

        if self.jobs.is_empty() && self.failed.is_empty() {
            self.state = LoaderState::SettledOk;
            info!(
                passes = pass,
                started = started.len(),
                skipped = skipped.len(),
                total = self.modules.len(),
                "module loader: all modules started"
            );
            return PassSummary {
                started,
                failed: failed_now,
                skipped,
                report: None,
            };
        }

        let classification =
            classify_blockage(&self.jobs, &self.registry, &self.modules, &self.failed);
        let boot_report = report(&classification);

        self.state = LoaderState::SettledWithErrors;
        error!(
            passes = pass,
            pending = self.jobs.len(),
            failed = self.failed.len(),
            "module loader settled with errors:\n{boot_report}"
        );
        let _ = self
            .events
            .send(LoaderEvent::SettledWithErrors(boot_report.clone()));

        PassSummary {
            started,
            failed: failed_now,
            skipped,
            report: Some(boot_report),
        }
    }

    /// Move non-installable jobs, and every job depending on one, to `skipped`.
    fn skip_uninstallable(&mut self, graph: &DagGraph) {
        for (name, root) in skipped_jobs(&self.jobs, graph) {
            self.jobs.remove(&name);
            if name == root {
                warn!(module = %name, "module not installable; skipped");
            } else {
                info!(
                    module = %name,
                    dependency = %root,
                    "its direct/indirect dependency is not installable; skipped"
                );
            }
            self.skipped.insert(name, root);
        }
    }

    fn record_failure(&mut self, graph: &DagGraph, name: &str, message: String) {
        warn!(
            module = %name,
            error = %message,
            "factory failed; module will not be retried"
        );
        for dependent in graph
            .transitive_dependents(name)
            .iter()
            .filter(|d| self.jobs.contains(*d))
        {
            info!(
                module = %dependent,
                dependency = %name,
                "its direct/indirect dependency failed; module will not start"
            );
        }
        self.failed.insert(name.to_string(), message);
    }

    /// Subscribe to loader events. Only events sent after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Value of a started module.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.modules.get(name)
    }

    pub fn module(&self, name: &str) -> Option<&Module<T>> {
        self.modules.module(name)
    }

    /// Started modules, in start order.
    pub fn modules(&self) -> impl Iterator<Item = &Module<T>> {
        self.modules.iter()
    }

    pub fn is_started(&self, name: &str) -> bool {
        self.modules.contains(name)
    }

    pub fn factory(&self, name: &str) -> Option<&Factory<T>> {
        self.registry.get(name)
    }

    pub fn registry(&self) -> &FactoryRegistry<T> {
        &self.registry
    }

    /// Registered names that have neither started nor failed, sorted.
    pub fn pending_jobs(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|s| s.as_str())
    }

    /// Skipped modules and the non-installable module responsible, sorted by name.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.skipped.iter().map(|(n, r)| (n.as_str(), r.as_str()))
    }

    /// Failed factories and their error messages, sorted by name.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.failed.iter().map(|(n, e)| (n.as_str(), e.as_str()))
    }

    /// Adjacency snapshot of the current registry.
    pub fn graph(&self) -> DagGraph {
        DagGraph::from_registry(&self.registry)
    }

    /// The order a clean boot starts installable modules in, or why none exists.
    pub fn startup_order(&self) -> Result<Vec<ModuleName>> {
        startup_order(&self.graph())
    }

    /// Current diagnostic snapshot, or `None` if nothing is pending or failed.
    pub fn report(&self) -> Option<BootReport> {
        let classification =
            classify_blockage(&self.jobs, &self.registry, &self.modules, &self.failed);
        if classification.is_empty() {
            return None;
        }
        Some(report(&classification))
    }
}

impl ModuleLoader<AnyModule> {
    /// Started module downcast to its concrete type.
    pub fn get_as<U: Any + Send + Sync>(&self, name: &str) -> Option<Arc<U>> {
        let value = self.modules.get(name)?;
        Arc::clone(value).downcast::<U>().ok()
    }
}

impl<T> Default for ModuleLoader<T> {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl<T> std::fmt::Debug for ModuleLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("state", &self.state)
            .field("registered", &self.registry.len())
            .field("started", &self.modules.len())
            .field("jobs", &self.jobs)
            .field("failed", &self.failed)
            .field("skipped", &self.skipped)
            .finish()
    }
}

enum Outcome<T> {
    Started(T),
    Failed(String),
    Panicked(String, Box<dyn Any + Send>),
}

/// Run one factory. Panics are always caught here; the caller decides
/// whether to resume them.
fn instantiate<T>(
    factory: &Factory<T>,
    registry: &FactoryRegistry<T>,
    modules: &ModuleTable<T>,
) -> Outcome<T> {
    let require = Require::new(factory, registry, modules);

    match panic::catch_unwind(AssertUnwindSafe(|| factory.invoke(&require))) {
        Ok(Ok(value)) => Outcome::Started(value),
        Ok(Err(e)) => Outcome::Failed(format!("{e:#}")),
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref()), payload),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("factory panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("factory panicked: {s}")
    } else {
        "factory panicked".to_string()
    }
}
