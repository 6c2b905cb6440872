// src/registry/mod.rs

//! Factory registry.
//!
//! - [`factory`] defines a single named factory plus its dependency list.
//! - [`FactoryRegistry`] stores factories by name. It only ever grows; the
//!   loader decides whether a duplicate name may replace an existing entry.

pub mod factory;

use std::collections::BTreeMap;

use crate::types::ModuleName;

pub use factory::{Factory, FactoryFn};

/// Result of inserting a factory into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The name was not registered before.
    New,
    /// An existing factory with the same name was replaced.
    Replaced,
}

/// Name-keyed store of factories.
///
/// Backed by a `BTreeMap` so that every traversal (passes, diagnostics,
/// startup order) sees names in the same order.
pub struct FactoryRegistry<T> {
    factories: BTreeMap<ModuleName, Factory<T>>,
}

impl<T> FactoryRegistry<T> {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Store `factory`, replacing any factory with the same name.
    pub fn insert(&mut self, factory: Factory<T>) -> Registration {
        match self.factories.insert(factory.name().to_string(), factory) {
            Some(_) => Registration::Replaced,
            None => Registration::New,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Factory<T>> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|s| s.as_str())
    }

    /// All registered factories, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Factory<T>> {
        self.factories.values()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<T> Default for FactoryRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for FactoryRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.values()).finish()
    }
}
