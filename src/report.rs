// src/report.rs

//! Boot error reporting.
//!
//! Turns an [`ErrorClassification`] into a [`BootReport`]: a value that can
//! be printed for humans (`Display`) or serialized for tools (`Serialize`).
//! The reporter only classifies and formats. Whether a report is fatal is
//! up to the host.

use std::fmt;

use serde::Serialize;

use crate::dag::ErrorClassification;
use crate::types::ModuleName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub witness: ModuleName,
    pub path: Vec<ModuleName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedModule {
    pub name: ModuleName,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDependency {
    pub name: ModuleName,
    pub required_by: Vec<ModuleName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnloadedModule {
    pub name: ModuleName,
    /// Direct dependencies that are not started yet.
    pub waiting_on: Vec<ModuleName>,
    /// Root causes upstream: missing names, failed modules, the cycle witness.
    pub blocked_by: Vec<ModuleName>,
}

/// Diagnostic snapshot of everything that kept the loader from settling cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootReport {
    pub cycle: Option<CycleReport>,
    pub failed: Vec<FailedModule>,
    pub missing: Vec<MissingDependency>,
    pub unloaded: Vec<UnloadedModule>,
}

impl BootReport {
    /// `true` if the report holds no issue at all.
    pub fn is_clean(&self) -> bool {
        self.cycle.is_none()
            && self.failed.is_empty()
            && self.missing.is_empty()
            && self.unloaded.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        usize::from(self.cycle.is_some())
            + self.failed.len()
            + self.missing.len()
            + self.unloaded.len()
    }

    /// Every module name mentioned as failed, cyclic or unloaded.
    pub fn affected_modules(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .cycle
            .iter()
            .map(|c| c.witness.as_str())
            .chain(self.failed.iter().map(|f| f.name.as_str()))
            .chain(self.unloaded.iter().map(|u| u.name.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Build a [`BootReport`] from a classification. Never fails.
pub fn report(classification: &ErrorClassification) -> BootReport {
    let cycle = classification.cycle.as_ref().map(|witness| CycleReport {
        witness: witness.clone(),
        path: classification.cycle_path.clone(),
    });

    let failed = classification
        .failed
        .iter()
        .map(|(name, error)| FailedModule {
            name: name.clone(),
            error: error.clone(),
        })
        .collect();

    let missing = classification
        .missing
        .iter()
        .map(|(name, required_by)| MissingDependency {
            name: name.clone(),
            required_by: required_by.iter().cloned().collect(),
        })
        .collect();

    let unloaded = classification
        .unloaded
        .iter()
        .map(|(name, waiting_on)| UnloadedModule {
            name: name.clone(),
            waiting_on: waiting_on.clone(),
            blocked_by: classification
                .blocked_by
                .get(name)
                .map(|roots| roots.iter().cloned().collect())
                .unwrap_or_default(),
        })
        .collect();

    BootReport {
        cycle,
        failed,
        missing,
        unloaded,
    }
}

impl fmt::Display for BootReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "all modules started");
        }

        if let Some(ref cycle) = self.cycle {
            writeln!(
                f,
                "cycle: {} ({})",
                cycle.witness,
                cycle.path.join(" -> ")
            )?;
        }

        if !self.failed.is_empty() {
            writeln!(f, "failed ({}):", self.failed.len())?;
            for m in &self.failed {
                writeln!(f, "  - {}: {}", m.name, m.error)?;
            }
        }

        if !self.missing.is_empty() {
            writeln!(f, "missing dependencies ({}):", self.missing.len())?;
            for m in &self.missing {
                writeln!(f, "  - {} (required by {})", m.name, m.required_by.join(", "))?;
            }
        }

        if !self.unloaded.is_empty() {
            writeln!(f, "unloaded ({}):", self.unloaded.len())?;
            for m in &self.unloaded {
                write!(f, "  - {}", m.name)?;
                if !m.waiting_on.is_empty() {
                    write!(f, " (waiting on {}", m.waiting_on.join(", "))?;
                    // Only worth printing when the cause sits further upstream.
                    if m.blocked_by.iter().any(|root| !m.waiting_on.contains(root)) {
                        write!(f, "; blocked by {}", m.blocked_by.join(", "))?;
                    }
                    write!(f, ")")?;
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}
