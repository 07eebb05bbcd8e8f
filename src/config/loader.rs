//! Configuration loading with layered precedence.
//!
//! Layers are composed (lowest to highest): engine defaults, configuration
//! file, environment variables, caller overrides.
//!
//! The loader drives `MergeComposer` itself rather than the derived `load()`
//! so that environment values are validated before merging and so that the
//! environment is read through [`mockable::Env`].
//!
//! # Environment Variable Handling
//!
//! Typed variables with unparseable values (e.g. `KASSERT_SKIP_DELETE=maybe`
//! or `KASSERT_TIMEOUTS_APPLY=soon`) return an error immediately rather than
//! falling back to defaults. String variables such as `KASSERT_NAMESPACE` are
//! always accepted here and validated after the merge.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{ConfigOverrides, EngineConfig};
use crate::error::{ConfigError, Result};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "KASSERT_CONFIG_PATH";

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Boolean value (`true`/`false`).
    Bool,
    /// Unsigned 64-bit integer.
    U64,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    env_var: &'static str,
    path: &'static [&'static str],
    var_type: EnvVarType,
}

const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "KASSERT_NAMESPACE",
        path: &["namespace"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "KASSERT_TEMPLATE",
        path: &["template"],
        var_type: EnvVarType::Bool,
    },
    EnvVarSpec {
        env_var: "KASSERT_SKIP_DELETE",
        path: &["skip_delete"],
        var_type: EnvVarType::Bool,
    },
    EnvVarSpec {
        env_var: "KASSERT_FAIL_FAST_ON_CONFLICT",
        path: &["fail_fast_on_conflict"],
        var_type: EnvVarType::Bool,
    },
    // Timeouts, in seconds
    EnvVarSpec {
        env_var: "KASSERT_TIMEOUTS_APPLY",
        path: &["timeouts", "apply"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "KASSERT_TIMEOUTS_ASSERT",
        path: &["timeouts", "assert"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "KASSERT_TIMEOUTS_CLEANUP",
        path: &["timeouts", "cleanup"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "KASSERT_TIMEOUTS_DELETE",
        path: &["timeouts", "delete"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "KASSERT_TIMEOUTS_ERROR",
        path: &["timeouts", "error"],
        var_type: EnvVarType::U64,
    },
    EnvVarSpec {
        env_var: "KASSERT_TIMEOUTS_EXEC",
        path: &["timeouts", "exec"],
        var_type: EnvVarType::U64,
    },
];

/// Returns the environment variable names recognised by the loader.
///
/// Tests use this to clear every `KASSERT_*` variable without keeping a
/// second list in sync.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS
        .iter()
        .map(|spec| spec.env_var)
        .chain(std::iter::once(CONFIG_PATH_ENV))
        .collect()
}

/// Read a TOML file through `cap_std` and push it to the composer.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let current_dir = Utf8PathBuf::from(".");
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| current_dir.as_ref());
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Pick the configuration file: explicit override, then
/// `KASSERT_CONFIG_PATH`, then the discovered dotfile or XDG path.
fn find_config_file<E: mockable::Env>(
    overrides: &ConfigOverrides,
    env: &E,
) -> Option<Utf8PathBuf> {
    overrides
        .config
        .clone()
        .or_else(|| {
            env.string(CONFIG_PATH_ENV)
                .filter(|value| !value.is_empty())
                .map(Utf8PathBuf::from)
        })
        .filter(|path| path.exists())
        .or_else(|| {
            ConfigDiscovery::builder("kassert")
                .config_file_name("config.toml")
                .dotfile_name(".kassert.toml")
                .build()
                .candidates()
                .into_iter()
                .filter(|path| path.exists())
                .find_map(|path| Utf8PathBuf::try_from(path).ok())
        })
}

/// Load configuration from the process environment.
///
/// # Errors
///
/// See [`load_config_with_env`].
pub fn load_config(overrides: &ConfigOverrides) -> Result<EngineConfig> {
    load_config_with_env(overrides, &mockable::DefaultEnv::new())
}

/// Load configuration with full layer precedence, reading variables from
/// `env`.
///
/// # Errors
///
/// Returns `ConfigError` when:
/// - the configuration file cannot be read or is not valid TOML
/// - a typed environment variable has an unparseable value
/// - the merged layers do not form a valid [`EngineConfig`]
/// - the merged namespace or a timeout fails validation
pub fn load_config_with_env<E: mockable::Env>(
    overrides: &ConfigOverrides,
    env: &E,
) -> Result<EngineConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(EngineConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(path) = find_config_file(overrides, env) {
        load_config_file(&path, &mut composer)?;
    }

    let env_values = collect_env_vars(env)?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_overrides(overrides);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        EngineConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;
    config.validate()?;
    Ok(config)
}

/// Collect `KASSERT_*` variables into a JSON value shaped like the config.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` when a bool or integer variable does
/// not parse.
fn collect_env_vars<E: mockable::Env>(env: &E) -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Some(raw_value) = env.string(spec.env_var) else {
            continue;
        };

        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            EnvVarType::Bool => match raw_value.parse::<bool>() {
                Ok(b) => Value::Bool(b),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected bool (true/false), got '{raw_value}'"),
                    }
                    .into());
                }
            },
            EnvVarType::U64 => match raw_value.parse::<u64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected unsigned integer, got '{raw_value}'"),
                    }
                    .into());
                }
            },
        };

        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Insert a value at a nested path, creating intermediate objects.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

/// Build a JSON value containing the caller's overrides.
fn build_overrides(overrides: &ConfigOverrides) -> Value {
    let mut values = Map::new();

    if let Some(ref namespace) = overrides.namespace {
        values.insert("namespace".to_owned(), Value::String(namespace.clone()));
    }

    if overrides.skip_delete {
        values.insert("skip_delete".to_owned(), Value::Bool(true));
    }

    if values.is_empty() {
        Value::Null
    } else {
        Value::Object(values)
    }
}
