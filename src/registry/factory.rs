// src/registry/factory.rs

use std::fmt;

use crate::engine::Require;
use crate::types::ModuleName;

/// Boxed factory function.
///
/// Receives the [`Require`] capability for its dependencies and returns the
/// module value, or an error if the module cannot be built.
pub type FactoryFn<T> = Box<dyn Fn(&Require<'_, T>) -> anyhow::Result<T>>;

/// A named unit of deferred work plus the names it needs started first.
pub struct Factory<T> {
    name: ModuleName,
    dependencies: Vec<ModuleName>,
    ignore_missing_dependencies: bool,
    installable: bool,
    function: FactoryFn<T>,
}

impl<T> Factory<T> {
    pub fn new<I, F>(name: impl Into<ModuleName>, dependencies: I, function: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ModuleName>,
        F: Fn(&Require<'_, T>) -> anyhow::Result<T> + 'static,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            ignore_missing_dependencies: false,
            installable: true,
            function: Box::new(function),
        }
    }

    /// Do not block on dependencies that are never registered.
    ///
    /// `Require::require` returns `Ok(None)` for such names instead of an
    /// error, so the factory must cope with their absence.
    pub fn ignore_missing_dependencies(mut self, ignore: bool) -> Self {
        self.ignore_missing_dependencies = ignore;
        self
    }

    /// Mark the module as not installable.
    ///
    /// The loader never invokes a non-installable factory. It and every
    /// module depending on it, directly or not, are skipped with a warning
    /// instead of being reported as errors.
    pub fn installable(mut self, installable: bool) -> Self {
        self.installable = installable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dependency names, in declaration order.
    pub fn dependencies(&self) -> &[ModuleName] {
        &self.dependencies
    }

    pub fn ignores_missing_dependencies(&self) -> bool {
        self.ignore_missing_dependencies
    }

    pub fn is_installable(&self) -> bool {
        self.installable
    }

    pub(crate) fn invoke(&self, require: &Require<'_, T>) -> anyhow::Result<T> {
        (self.function)(require)
    }
}

impl<T> fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("ignore_missing_dependencies", &self.ignore_missing_dependencies)
            .field("installable", &self.installable)
            .finish_non_exhaustive()
    }
}
