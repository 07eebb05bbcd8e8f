//! Shared fixtures and helper functions for config tests.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use mockable::MockEnv;
use ortho_config::MergeComposer;
use rstest::fixture;
use tempfile::NamedTempFile;

use crate::config::EngineConfig;

/// Fixture providing an `EngineConfig` parsed from a full TOML example.
#[fixture]
pub fn engine_config_from_full_toml() -> EngineConfig {
    let toml = r#"
        namespace = "e2e"
        template = false
        skip_delete = true
        fail_fast_on_conflict = true

        [timeouts]
        apply = 7
        assert = 11
        cleanup = 13
        delete = 17
        error = 19
        exec = 23
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `EngineConfig` parsed from a minimal TOML example.
#[fixture]
pub fn engine_config_from_partial_toml() -> EngineConfig {
    let toml = r#"
        namespace = "smoke"

        [timeouts]
        apply = 9
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(EngineConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `EngineConfig`.
pub fn merge_config(
    composer: MergeComposer,
) -> Result<EngineConfig, Arc<ortho_config::OrthoError>> {
    EngineConfig::merge_from_layers(composer.layers())
}

/// Creates a `MockEnv` answering from a fixed table and `None` otherwise.
pub fn env_with_vars(mappings: Vec<(&'static str, String)>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string().returning(move |key| {
        mappings
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
    });
    env
}

/// Writes `content` to a temporary TOML file and returns it with its path.
pub fn config_file(content: &str) -> (NamedTempFile, Utf8PathBuf) {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file should be created");
    file.write_all(content.as_bytes())
        .expect("temp file should be writable");
    let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf())
        .expect("temp path should be UTF-8");
    (file, path)
}
