//! Layer precedence tests for `MergeComposer` config composition.

use ortho_config::serde_json::json;
use rstest::rstest;

use crate::config::EngineConfig;
use crate::config::tests::helpers::{create_composer_with_defaults, merge_config};

/// Serialised defaults survive a round trip through `MergeComposer`, which
/// is exactly what `load_config` relies on for its first layer.
#[rstest]
fn serialised_defaults_round_trip() {
    let composer = create_composer_with_defaults().expect("composer creation should succeed");
    let config = merge_config(composer).expect("merge should succeed");
    assert_eq!(config, EngineConfig::default());
}

#[rstest]
fn file_overrides_defaults() {
    let mut composer = create_composer_with_defaults().expect("composer creation should succeed");
    composer.push_file(
        json!({
            "namespace": "from-file",
            "timeouts": { "apply": 12 }
        }),
        None,
    );

    let config = merge_config(composer).expect("merge should succeed");

    assert_eq!(config.namespace, "from-file");
    assert_eq!(config.timeouts.apply, 12);
    assert_eq!(config.timeouts.assert, 30, "sibling timeouts keep defaults");
}

#[rstest]
fn environment_overrides_file() {
    let mut composer = create_composer_with_defaults().expect("composer creation should succeed");
    composer.push_file(json!({ "namespace": "from-file", "skip_delete": true }), None);
    composer.push_environment(json!({ "namespace": "from-env" }));

    let config = merge_config(composer).expect("merge should succeed");

    assert_eq!(config.namespace, "from-env");
    assert!(config.skip_delete, "file value should survive");
}

#[rstest]
fn cli_overrides_environment() {
    let mut composer = create_composer_with_defaults().expect("composer creation should succeed");
    composer.push_file(json!({ "namespace": "from-file" }), None);
    composer.push_environment(json!({ "namespace": "from-env", "template": false }));
    composer.push_cli(json!({ "namespace": "from-cli" }));

    let config = merge_config(composer).expect("merge should succeed");

    assert_eq!(config.namespace, "from-cli");
    assert!(!config.template, "environment value should survive");
}
