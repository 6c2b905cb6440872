#![allow(dead_code)]

use std::collections::BTreeMap;

use modloader::config::{LoaderConfig, Manifest, ModuleSpec, RawManifest};
use modloader::ReregistrationPolicy;

/// Builder for `Manifest` to simplify test setup.
pub struct ManifestBuilder {
    manifest: RawManifest,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            manifest: RawManifest {
                loader: LoaderConfig::default(),
                module: BTreeMap::new(),
            },
        }
    }

    pub fn with_module(mut self, name: &str, spec: ModuleSpec) -> Self {
        self.manifest.module.insert(name.to_string(), spec);
        self
    }

    pub fn reregistration(mut self, policy: ReregistrationPolicy) -> Self {
        self.manifest.loader.reregistration = policy;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.manifest.loader.event_capacity = capacity;
        self
    }

    /// The raw manifest, for tests that exercise validation failures.
    pub fn build_raw(self) -> RawManifest {
        self.manifest
    }

    pub fn build(self) -> Manifest {
        Manifest::try_from(self.manifest).expect("Failed to build valid manifest from builder")
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ModuleSpec`.
pub struct ModuleSpecBuilder {
    spec: ModuleSpec,
}

impl ModuleSpecBuilder {
    pub fn new() -> Self {
        Self {
            spec: ModuleSpec::default(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.spec.dependencies.push(dep.to_string());
        self
    }

    pub fn ignore_missing(mut self, val: bool) -> Self {
        self.spec.ignore_missing_dependencies = val;
        self
    }

    pub fn installable(mut self, val: bool) -> Self {
        self.spec.installable = val;
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.spec.fail = Some(message.to_string());
        self
    }

    pub fn build(self) -> ModuleSpec {
        self.spec
    }
}

impl Default for ModuleSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}
