// src/dag/mod.rs

//! Dependency graph and resolution.
//!
//! - [`graph`] holds an adjacency snapshot of the registered factories.
//! - [`resolver`] decides runnability, computes a startup order, and
//!   classifies jobs that can never run.

pub mod graph;
pub mod resolver;

pub use graph::DagGraph;
pub use resolver::{
    ErrorClassification, can_run, classify_blockage, skipped_jobs, startup_order, waiting_on,
};
