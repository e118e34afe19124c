//! Coverage for config loading and path resolution.

use std::fs;
use std::path::Path;

use signwatch::config::{config_dir, Config, RouteTargets};
use signwatch::transports::TransportKind;

#[test]
fn config_dir_resolves() {
    let path = match config_dir() {
        Ok(path) => path,
        Err(err) => panic!("config dir should resolve: {err}"),
    };
    assert!(path.ends_with(".signwatch"));
}

#[test]
fn missing_file_loads_defaults() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let config = match Config::load(&tmp.path().join("absent.toml")) {
        Ok(config) => config,
        Err(err) => panic!("missing file should load defaults: {err}"),
    };
    assert_eq!(config.runtime.shutdown_grace_secs, 10);
    assert!(config.filters.is_empty());
    assert!(config.transports.is_empty());
}

#[test]
fn load_reads_file_sections() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("config.toml");
    fs::write(
        &path,
        r#"
[runtime]
shutdown_grace_secs = 4
log_dir = "/var/log/signwatch"

[filters.everything]
kind = "all"

[transports.out]
kind = "stdout"
format = "activity"

[routes]
everything = "out"
"#,
    )
    .expect("should write config");

    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(err) => panic!("config should load: {err}"),
    };
    assert_eq!(config.runtime.shutdown_grace_secs, 4);
    assert_eq!(
        config.log_dir().ok().as_deref(),
        Some(Path::new("/var/log/signwatch"))
    );
    assert_eq!(config.transports["out"].kind, TransportKind::Stdout);
    assert_eq!(
        config.routes["everything"],
        RouteTargets::One("out".to_owned())
    );
}

#[test]
fn malformed_file_is_an_error() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[routes\neverything = ").expect("should write config");
    assert!(Config::load(&path).is_err());
}

#[test]
fn zero_grace_fails_validation_on_load() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[runtime]\nshutdown_grace_secs = 0\n").expect("should write config");
    assert!(Config::load(&path).is_err());
}

#[test]
fn default_log_dir_is_under_config_dir() {
    let config = Config::default();
    let (Ok(log_dir), Ok(base)) = (config.log_dir(), config_dir()) else {
        panic!("home directory should resolve");
    };
    assert_eq!(log_dir, base.join("logs"));
}

#[test]
fn config_path_defaults_to_home() {
    let path = match Config::config_path_with(None, |_| None) {
        Ok(path) => path,
        Err(err) => panic!("config path should resolve: {err}"),
    };
    assert!(path.ends_with(".signwatch/config.toml"));
}

#[test]
fn newusers_transport_defaults() {
    let toml = "[transports.fresh]\nkind = \"newusers\"\nformat = \"newusers\"\n";
    let config = match Config::from_toml(toml) {
        Ok(config) => config,
        Err(err) => panic!("config should parse: {err}"),
    };
    let fresh = &config.transports["fresh"];
    assert_eq!(fresh.delay_secs, 30 * 60);
    assert_eq!(fresh.flush_interval_secs, 5);
}

#[test]
fn log_file_must_be_a_plain_name() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[runtime]\nlog_file = \"../escape.log\"\n").expect("should write config");
    assert!(Config::load(&path).is_err());
}

#[test]
fn log_level_env_override() {
    let mut config = Config::default();
    config.apply_overrides(|key| (key == "SIGNWATCH_LOG_LEVEL").then(|| "debug".to_owned()));
    assert_eq!(config.runtime.log_level, "debug");
}
