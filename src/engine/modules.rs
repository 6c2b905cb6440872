// src/engine/modules.rs

//! Live module table.

use std::collections::HashMap;

use crate::types::ModuleName;

/// The value produced by running a factory once.
#[derive(Debug, Clone)]
pub struct Module<T> {
    name: ModuleName,
    value: T,
    start_index: usize,
}

impl<T> Module<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Position of this module in the global start order (0-based).
    pub fn start_index(&self) -> usize {
        self.start_index
    }
}

/// Started modules, in the order they were started.
///
/// Entries are only ever appended; a module is never replaced or removed.
#[derive(Debug)]
pub struct ModuleTable<T> {
    index: HashMap<ModuleName, usize>,
    modules: Vec<Module<T>>,
}

impl<T> ModuleTable<T> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            modules: Vec::new(),
        }
    }

    /// Append a module and return its start index.
    ///
    /// The caller guarantees `name` is not already present.
    pub(crate) fn insert(&mut self, name: ModuleName, value: T) -> usize {
        let start_index = self.modules.len();
        self.index.insert(name.clone(), start_index);
        self.modules.push(Module {
            name,
            value,
            start_index,
        });
        start_index
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.module(name).map(|m| &m.value)
    }

    pub fn module(&self, name: &str) -> Option<&Module<T>> {
        self.index.get(name).map(|&i| &self.modules[i])
    }

    /// Modules in start order.
    pub fn iter(&self) -> impl Iterator<Item = &Module<T>> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<T> Default for ModuleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
