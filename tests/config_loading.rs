// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use pagewatch::config::{load_and_validate, load_or_default};
use pagewatch::errors::PagewatchError;
use pagewatch::types::StorageBackend;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn empty_file_yields_daily_midnight_pacific() {
    let file = config_file("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.schedule.cron, "0 0 * * *");
    assert_eq!(cfg.cadence().timezone().name(), "America/Los_Angeles");
    assert_eq!(cfg.fetch_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.storage_backend(), StorageBackend::File);
    assert_eq!(cfg.storage_path(), PathBuf::from("pagewatch.json").as_path());
}

#[test]
fn explicit_sections_override_defaults() {
    let file = config_file(
        r#"
[schedule]
cron = "0 30 6 * * *"
timezone = "Europe/Oslo"

[fetch]
timeout = "500ms"
user_agent = "custom-agent"

[storage]
backend = "memory"
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.cadence().expression(), "0 30 6 * * *");
    assert_eq!(cfg.cadence().timezone().name(), "Europe/Oslo");
    assert_eq!(cfg.fetch_timeout(), Duration::from_millis(500));
    assert_eq!(cfg.fetch.user_agent, "custom-agent");
    assert_eq!(cfg.storage_backend(), StorageBackend::Memory);
}

#[test]
fn invalid_cron_is_a_config_error() {
    let file = config_file(
        r#"
[schedule]
cron = "every day at noon"
"#,
    );

    match load_and_validate(file.path()) {
        Err(PagewatchError::ConfigError(msg)) => assert!(msg.contains("[schedule]"), "{msg}"),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn unknown_timezone_is_a_config_error() {
    let file = config_file(
        r#"
[schedule]
timezone = "Mars/Olympus_Mons"
"#,
    );

    let result = load_and_validate(file.path());
    assert!(matches!(result, Err(PagewatchError::ConfigError(_))));
}

#[test]
fn zero_fetch_timeout_is_rejected() {
    let file = config_file(
        r#"
[fetch]
timeout = "0s"
"#,
    );

    match load_and_validate(file.path()) {
        Err(PagewatchError::ConfigError(msg)) => {
            assert!(msg.contains("greater than zero"), "{msg}")
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn malformed_duration_is_rejected() {
    let file = config_file(
        r#"
[fetch]
timeout = "thirty seconds"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(PagewatchError::ConfigError(_))
    ));
}

#[test]
fn unknown_fields_are_a_toml_error() {
    let file = config_file(
        r#"
[schedule]
cron = "0 0 * * *"
interval = "1d"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(PagewatchError::TomlError(_))
    ));
}

#[test]
fn missing_explicit_config_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere.toml");

    match load_or_default(&missing) {
        Err(PagewatchError::ConfigError(msg)) => assert!(msg.contains("nowhere.toml"), "{msg}"),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn builder_configs_open_the_selected_registry() {
    use pagewatch::registry::open_registry;
    use pagewatch_test_utils::builders::ConfigFileBuilder;

    let cfg = ConfigFileBuilder::new()
        .cron("0 */6 * * *")
        .timezone("UTC")
        .fetch_timeout("2s")
        .memory_storage()
        .build();
    assert_eq!(cfg.fetch_timeout(), Duration::from_secs(2));

    let registry = open_registry(cfg.storage_backend(), cfg.storage_path()).unwrap();
    let id = registry.insert_resource("https://example.test/").unwrap();
    assert_eq!(registry.list_resources().unwrap()[0].id, id);

    let dir = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .file_storage(dir.path().join("state/registry.json"))
        .build();
    let registry = open_registry(cfg.storage_backend(), cfg.storage_path()).unwrap();
    registry.insert_resource("https://example.test/").unwrap();
    assert!(cfg.storage_path().exists());
}

#[test]
fn empty_storage_path_is_rejected_for_file_backend() {
    use pagewatch_test_utils::builders::ConfigFileBuilder;

    let raw = ConfigFileBuilder::new().file_storage("").raw();
    assert!(matches!(
        pagewatch::config::ConfigFile::try_from(raw),
        Err(PagewatchError::ConfigError(_))
    ));
}

#[test]
fn oversized_fetch_timeout_is_a_config_error() {
    let file = config_file(
        r#"
[fetch]
timeout = "9999999999999999999h"
"#,
    );

    match load_and_validate(file.path()) {
        Err(PagewatchError::ConfigError(msg)) => assert!(msg.contains("too large"), "{msg}"),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}
