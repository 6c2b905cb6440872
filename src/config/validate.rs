// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{Manifest, RawManifest};
use crate::errors::{LoaderError, Result};

impl TryFrom<RawManifest> for Manifest {
    type Error = LoaderError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_manifest(&raw)?;
        Ok(Manifest::new_unchecked(raw.loader, raw.module))
    }
}

/// Structural checks only.
///
/// Unknown dependencies and cycles are legal in a manifest: the loader
/// reports them at boot time, which is what the manifest is there to
/// rehearse.
pub fn validate_manifest(raw: &RawManifest) -> Result<()> {
    ensure_has_modules(raw)?;
    validate_loader_section(raw)?;
    validate_module_names(raw)?;
    validate_dependency_lists(raw)?;
    Ok(())
}

fn ensure_has_modules(raw: &RawManifest) -> Result<()> {
    if raw.module.is_empty() {
        return Err(LoaderError::Config(
            "manifest must contain at least one [module.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_loader_section(raw: &RawManifest) -> Result<()> {
    // reregistration is strongly typed and validated during deserialization.

    if raw.loader.event_capacity == 0 {
        return Err(LoaderError::Config(
            "[loader].event_capacity must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_module_names(raw: &RawManifest) -> Result<()> {
    for name in raw.module.keys() {
        if name.trim().is_empty() {
            return Err(LoaderError::Config(
                "module names must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_dependency_lists(raw: &RawManifest) -> Result<()> {
    for (name, spec) in raw.module.iter() {
        let mut seen: HashSet<&str> = HashSet::new();
        for dep in spec.dependencies.iter() {
            if dep.trim().is_empty() {
                return Err(LoaderError::Config(format!(
                    "module '{}' has an empty name in `dependencies`",
                    name
                )));
            }
            if !seen.insert(dep.as_str()) {
                return Err(LoaderError::Config(format!(
                    "module '{}' lists dependency '{}' more than once",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}
