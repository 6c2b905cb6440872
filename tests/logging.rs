// tests/logging.rs

use tracing::Level;

use modloader::cli::LogLevel;
use modloader::logging::resolve_level;

#[test]
fn cli_level_wins_over_env() {
    assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
    assert_eq!(resolve_level(Some(LogLevel::Warn), None), Level::WARN);
}

#[test]
fn env_value_is_parsed_leniently() {
    assert_eq!(resolve_level(None, Some(" DEBUG ")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warning")), Level::WARN);
}

#[test]
fn falls_back_to_info() {
    assert_eq!(resolve_level(None, None), Level::INFO);
    assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
}
