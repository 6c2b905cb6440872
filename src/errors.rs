// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::report::BootReport;
use crate::types::ModuleName;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Factory already registered: {0}")]
    DuplicateFactory(ModuleName),

    #[error("Module already started, cannot re-register: {0}")]
    AlreadyStarted(ModuleName),

    #[error("Module '{requested}' is not started (required by '{requester}')")]
    NotStarted {
        requested: ModuleName,
        requester: ModuleName,
    },

    #[error("Missing dependency '{dependency}' (required by '{required_by}')")]
    MissingDependency {
        dependency: ModuleName,
        required_by: ModuleName,
    },

    #[error("Cycle detected in module graph involving '{0}'")]
    DependencyCycle(ModuleName),

    #[error("Module boot settled with errors:\n{0}")]
    Boot(Box<BootReport>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
