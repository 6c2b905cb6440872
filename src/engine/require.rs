// src/engine/require.rs

use tracing::debug;

use crate::engine::ModuleTable;
use crate::errors::{LoaderError, Result};
use crate::registry::{Factory, FactoryRegistry};

/// Dependency lookup handed to a factory while it runs.
///
/// This is the only view a factory gets of the loader: started modules can
/// be read, nothing can be mutated.
pub struct Require<'a, T> {
    requester: &'a Factory<T>,
    registry: &'a FactoryRegistry<T>,
    modules: &'a ModuleTable<T>,
}

impl<'a, T> Require<'a, T> {
    pub(crate) fn new(
        requester: &'a Factory<T>,
        registry: &'a FactoryRegistry<T>,
        modules: &'a ModuleTable<T>,
    ) -> Self {
        Self {
            requester,
            registry,
            modules,
        }
    }

    /// Name of the factory currently running.
    pub fn requester(&self) -> &str {
        self.requester.name()
    }

    /// Resolve a started module by name.
    ///
    /// - `Ok(Some(value))` if `name` has been started.
    /// - `Ok(None)` if `name` was never registered and the running factory
    ///   ignores missing dependencies.
    /// - `Err(LoaderError::NotStarted)` otherwise.
    pub fn require(&self, name: &str) -> Result<Option<&'a T>> {
        if let Some(value) = self.modules.get(name) {
            return Ok(Some(value));
        }

        if self.requester.ignores_missing_dependencies() && !self.registry.contains(name) {
            debug!(
                module = %self.requester.name(),
                dep = %name,
                "optional dependency not registered; resolving as absent"
            );
            return Ok(None);
        }

        Err(LoaderError::NotStarted {
            requested: name.to_string(),
            requester: self.requester.name().to_string(),
        })
    }

    /// Like [`Require::require`], but an absent optional dependency is an error too.
    pub fn module(&self, name: &str) -> Result<&'a T> {
        self.require(name)?.ok_or_else(|| LoaderError::NotStarted {
            requested: name.to_string(),
            requester: self.requester.name().to_string(),
        })
    }

    /// Whether `name` is already started.
    pub fn is_available(&self, name: &str) -> bool {
        self.modules.contains(name)
    }
}
