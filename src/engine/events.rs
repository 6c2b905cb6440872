// src/engine/events.rs

use crate::report::BootReport;
use crate::types::ModuleName;

/// Events published by the loader for external observers (boot progress
/// UIs, diagnostics).
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    /// A factory returned successfully and its module is now live.
    ModuleStarted {
        name: ModuleName,
        /// Modules started so far, including this one.
        started: usize,
        /// Factories registered at the time of the event.
        total: usize,
    },
    /// A `start()` call settled with failed or unresolved modules.
    SettledWithErrors(BootReport),
}
