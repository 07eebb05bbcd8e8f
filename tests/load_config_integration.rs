//! Integration tests for the `load_config()` public API.
//!
//! These exercise the process environment end to end, so every test runs
//! `#[serial]` and starts from a cleared `KASSERT_*` environment.


use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use kassert::config::{CONFIG_PATH_ENV, ConfigOverrides, EngineConfig, load_config};
use kassert::error::{ConfigError, KassertError};
use serial_test::serial;
use tempfile::NamedTempFile;
use test_utils::{clear_kassert_env, set_env_var};

/// Helper: Creates a temporary config file with the given TOML content.
fn temp_config_file(content: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

fn utf8_path(file: &NamedTempFile) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(file.path().to_path_buf()).expect("temp path should be UTF-8")
}

fn overrides_with_config(path: Utf8PathBuf) -> ConfigOverrides {
    ConfigOverrides {
        config: Some(path),
        ..ConfigOverrides::default()
    }
}

#[test]
#[serial]
fn load_config_returns_defaults_for_an_empty_file() {
    let _guard = clear_kassert_env();
    let file = temp_config_file("").expect("temp file should be created");

    let config = load_config(&overrides_with_config(utf8_path(&file)))
        .expect("load_config should succeed with defaults");

    assert_eq!(config, EngineConfig::default());
}

#[test]
#[serial]
fn load_config_reads_the_explicit_file() {
    let _guard = clear_kassert_env();
    let file = temp_config_file(
        r#"
        namespace = "integration"
        template = false

        [timeouts]
        apply = 2
        cleanup = 60
        "#,
    )
    .expect("temp file should be created");

    let config = load_config(&overrides_with_config(utf8_path(&file)))
        .expect("load_config should succeed");

    assert_eq!(config.namespace, "integration");
    assert!(!config.template);
    assert_eq!(config.timeouts().apply, Duration::from_secs(2));
    assert_eq!(config.timeouts().cleanup, Duration::from_secs(60));
}

#[test]
#[serial]
fn load_config_follows_the_config_path_variable() {
    let guard = clear_kassert_env();
    let file = temp_config_file(r#"namespace = "from-variable""#)
        .expect("temp file should be created");
    set_env_var(&guard, CONFIG_PATH_ENV, utf8_path(&file).as_str());

    let config = load_config(&ConfigOverrides::default()).expect("load_config should succeed");

    assert_eq!(config.namespace, "from-variable");
}

#[test]
#[serial]
fn environment_overrides_file_and_overrides_beat_both() {
    let guard = clear_kassert_env();
    let file = temp_config_file(
        r#"
        namespace = "from-file"
        fail_fast_on_conflict = false
        "#,
    )
    .expect("temp file should be created");
    set_env_var(&guard, "KASSERT_NAMESPACE", "from-env");
    set_env_var(&guard, "KASSERT_FAIL_FAST_ON_CONFLICT", "true");

    let overrides = ConfigOverrides {
        config: Some(utf8_path(&file)),
        namespace: Some(String::from("from-cli")),
        skip_delete: false,
    };
    let config = load_config(&overrides).expect("load_config should succeed");

    assert_eq!(config.namespace, "from-cli");
    assert!(config.fail_fast_on_conflict);
}

#[test]
#[serial]
fn invalid_timeout_variable_is_reported() {
    let guard = clear_kassert_env();
    let file = temp_config_file("").expect("temp file should be created");
    set_env_var(&guard, "KASSERT_TIMEOUTS_CLEANUP", "forever");

    let error = load_config(&overrides_with_config(utf8_path(&file)))
        .expect_err("load_config should fail");

    assert!(
        matches!(
            error,
            KassertError::Config(ConfigError::InvalidValue { ref field, .. })
                if field == "KASSERT_TIMEOUTS_CLEANUP"
        ),
        "unexpected error: {error:?}"
    );
}
