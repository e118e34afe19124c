//! Tests for `src/logging.rs`.

use signwatch::config::Config;
use signwatch::logging::{LogSettings, LoggingGuard};

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_production_creates_logs_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("nested").join("logs");
    assert!(!logs_dir.exists());

    // The global subscriber can only be installed once per process, so only
    // the directory is checked.
    let settings = LogSettings {
        dir: logs_dir.clone(),
        file_prefix: "relay.log".to_owned(),
        level: "info".to_owned(),
    };
    let _guard = signwatch::logging::init_production(&settings);
    assert!(logs_dir.exists(), "logs directory should be created");
}

#[test]
fn settings_come_from_runtime_section() {
    let toml = "[runtime]\nlog_dir = \"/var/log/sw\"\nlog_file = \"relay.log\"\nlog_level = \"debug\"\n";
    let config = match Config::from_toml(toml) {
        Ok(config) => config,
        Err(err) => panic!("config should parse: {err}"),
    };
    let settings = match config.log_settings() {
        Ok(settings) => settings,
        Err(err) => panic!("settings should resolve: {err}"),
    };
    assert_eq!(
        settings,
        LogSettings {
            dir: "/var/log/sw".into(),
            file_prefix: "relay.log".to_owned(),
            level: "debug".to_owned(),
        }
    );
}

#[test]
fn default_settings_name_the_relay() {
    let settings = match Config::default().log_settings() {
        Ok(settings) => settings,
        Err(err) => panic!("settings should resolve: {err}"),
    };
    assert_eq!(settings.file_prefix, "signwatch.log");
    assert_eq!(settings.level, "info");
}
