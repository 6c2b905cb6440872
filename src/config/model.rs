// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{ModuleName, ReregistrationPolicy};

/// Boot manifest as read from a TOML file, before validation.
///
/// ```toml
/// [loader]
/// reregistration = "overwrite"
/// event_capacity = 256
///
/// [module.core]
///
/// [module.web]
/// dependencies = ["core"]
///
/// [module.analytics]
/// dependencies = ["tracker"]
/// ignore_missing_dependencies = true
///
/// [module.legacy]
/// installable = false
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawManifest {
    /// Loader behaviour from `[loader]`.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// All modules from `[module.<name>]`.
    ///
    /// Keys are the *module names* (e.g. `"core"`, `"web"`).
    #[serde(default)]
    pub module: BTreeMap<ModuleName, ModuleSpec>,
}

/// Validated boot manifest.
///
/// Only constructible through `TryFrom<RawManifest>` (see
/// [`crate::config::validate`]), so holding one means the structural checks
/// passed. Cycles and missing dependencies are *not* checked here; the
/// loader reports those at boot time.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub loader: LoaderConfig,
    pub module: BTreeMap<ModuleName, ModuleSpec>,
}

impl Manifest {
    pub(crate) fn new_unchecked(
        loader: LoaderConfig,
        module: BTreeMap<ModuleName, ModuleSpec>,
    ) -> Self {
        Self { loader, module }
    }
}

/// `[loader]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// `"overwrite"` (default) or `"reject"`.
    ///
    /// Controls what happens when a factory name is registered twice.
    #[serde(default)]
    pub reregistration: ReregistrationPolicy,

    /// Buffer size of the event broadcast channel.
    ///
    /// Subscribers that fall further behind than this lose the oldest events.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Treat a panicking factory like one that returned an error.
    #[serde(default = "default_catch_panics")]
    pub catch_panics: bool,
}

fn default_event_capacity() -> usize {
    256
}

fn default_catch_panics() -> bool {
    true
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            reregistration: ReregistrationPolicy::default(),
            event_capacity: default_event_capacity(),
            catch_panics: default_catch_panics(),
        }
    }
}

/// `[module.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSpec {
    /// Modules that must be started before this one.
    #[serde(default)]
    pub dependencies: Vec<ModuleName>,

    /// Do not wait for dependencies that are never registered.
    #[serde(default)]
    pub ignore_missing_dependencies: bool,

    /// `false` skips the module, and everything depending on it, with a
    /// warning instead of starting it.
    #[serde(default = "default_installable")]
    pub installable: bool,

    /// Make the stub factory fail with this message.
    ///
    /// Lets a manifest rehearse how a boot degrades when a module breaks.
    #[serde(default)]
    pub fail: Option<String>,
}

fn default_installable() -> bool {
    true
}

impl Default for ModuleSpec {
    fn default() -> Self {
        Self {
            dependencies: Vec::new(),
            ignore_missing_dependencies: false,
            installable: default_installable(),
            fail: None,
        }
    }
}
