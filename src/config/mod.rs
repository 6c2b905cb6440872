// src/config/mod.rs

//! Boot manifest loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`), including the
//!   `[loader]` settings used by [`crate::engine::ModuleLoader`].
//! - Load a manifest from disk (`loader.rs`).
//! - Validate structural invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_manifest_path, load_and_validate, load_from_path};
pub use model::{LoaderConfig, Manifest, ModuleSpec, RawManifest};
pub use validate::validate_manifest;
