// src/types.rs

use std::any::Any;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

/// Canonical module name type used throughout the loader.
pub type ModuleName = String;

/// Default module value type when the host does not pick a concrete one.
///
/// The loader never looks inside a module; consumers downcast on their side.
pub type AnyModule = Arc<dyn Any + Send + Sync>;

/// What happens when a factory name is registered a second time.
///
/// - `Overwrite`: replace the stored factory. A pending job keeps its place;
///   a failed job is put back in the queue so the next `start()` retries it
///   (default behaviour).
/// - `Reject`: refuse the registration with `LoaderError::DuplicateFactory`.
///
/// Names that already produced a module can never be re-registered,
/// whichever policy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReregistrationPolicy {
    #[default]
    Overwrite,
    Reject,
}

impl FromStr for ReregistrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(ReregistrationPolicy::Overwrite),
            "reject" => Ok(ReregistrationPolicy::Reject),
            other => Err(format!(
                "invalid reregistration policy: {other} (expected \"overwrite\" or \"reject\")"
            )),
        }
    }
}

/// Output format for boot reports printed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}
