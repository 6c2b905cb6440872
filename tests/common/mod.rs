#![allow(dead_code)]

pub use modloader_test_utils::builders;
pub use modloader_test_utils::call_log::CallLog;
pub use modloader_test_utils::{init_tracing, no_deps};

use modloader::{ModuleLoader, Require};

pub type TestLoader = ModuleLoader<String>;

/// Factory that records its invocation and returns its own name.
pub fn recording(
    log: CallLog,
    name: &'static str,
) -> impl Fn(&Require<'_, String>) -> anyhow::Result<String> + 'static {
    move |_deps: &Require<'_, String>| {
        log.record(name);
        Ok(name.to_string())
    }
}

/// Factory that records its invocation and then fails with `message`.
pub fn failing(
    log: CallLog,
    name: &'static str,
    message: &'static str,
) -> impl Fn(&Require<'_, String>) -> anyhow::Result<String> + 'static {
    move |_deps: &Require<'_, String>| {
        log.record(name);
        anyhow::bail!("{message}")
    }
}
