// src/engine/mod.rs

//! Loader engine.
//!
//! This module ties together:
//! - the factory registry
//! - the dependency resolver
//! - the pass loop that instantiates runnable jobs
//! - the event channel observers subscribe to
//!
//! Everything here is synchronous. Factories run one at a time on the
//! caller's thread, inside [`ModuleLoader::start`].

/// Lifecycle of the loader.
///
/// `Idle -> Running -> (SettledOk | SettledWithErrors)`. Both settled states
/// accept new registrations; the next `start()` goes back to `Running`.
///
/// A `start()` with no pending job and no failure runs no pass and moves
/// straight to `SettledOk`, from `Idle` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// `start()` has never been called.
    Idle,
    /// A `start()` call is in progress.
    Running,
    /// Every registered module is started.
    SettledOk,
    /// Some modules failed or could not be resolved.
    SettledWithErrors,
}

pub mod events;
pub mod loader;
pub mod modules;
pub mod require;

pub use events::LoaderEvent;
pub use loader::{ModuleLoader, PassSummary};
pub use modules::{Module, ModuleTable};
pub use require::Require;
