//! Global subscriber installation

use pipestore::logging::{self, LoggingConfig};
use serial_test::serial;

#[test]
#[serial]
fn test_file_logging_installs_once() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("logs");
    let config = LoggingConfig {
        file: true,
        log_dir: Some(log_dir.clone()),
        ansi: false,
        ..Default::default()
    };

    let guard = logging::init(&config).unwrap();
    assert!(guard.is_some());
    assert!(log_dir.is_dir());
    tracing::info!("logging initialised");

    // A second subscriber is refused instead of panicking
    let err = logging::init(&LoggingConfig::default()).unwrap_err();
    assert!(err.is_config());
    drop(guard);
}

#[test]
#[serial]
fn test_default_config_round_trips_through_toml() {
    let config = LoggingConfig::default();
    let text = toml::to_string(&config).unwrap();
    let parsed: LoggingConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(parsed.filter, logging::DEFAULT_LOG_FILTER);
}
