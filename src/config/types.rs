//! Configuration data types for kassert.

use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, NamespaceError};
use crate::namespacer::DefaultNamespacer;
use crate::operation::Timeouts;

/// Namespace assigned to resources that do not declare one.
pub const DEFAULT_NAMESPACE: &str = "kassert";

/// Per-kind operation budgets, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Budget for apply and create operations.
    pub apply: u64,

    /// Budget for assert operations.
    pub assert: u64,

    /// Budget for cleanup at teardown.
    pub cleanup: u64,

    /// Budget for delete operations.
    pub delete: u64,

    /// Budget for error operations.
    pub error: u64,

    /// Budget for script and command operations.
    pub exec: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            apply: 5,
            assert: 30,
            cleanup: 30,
            delete: 15,
            error: 30,
            exec: 5,
        }
    }
}

impl TimeoutsConfig {
    /// Convert to engine durations.
    #[must_use]
    pub const fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            apply: Duration::from_secs(self.apply),
            assert: Duration::from_secs(self.assert),
            cleanup: Duration::from_secs(self.cleanup),
            delete: Duration::from_secs(self.delete),
            error: Duration::from_secs(self.error),
            exec: Duration::from_secs(self.exec),
        }
    }

    const fn entries(&self) -> [(&'static str, u64); 6] {
        [
            ("timeouts.apply", self.apply),
            ("timeouts.assert", self.assert),
            ("timeouts.cleanup", self.cleanup),
            ("timeouts.delete", self.delete),
            ("timeouts.error", self.error),
            ("timeouts.exec", self.exec),
        ]
    }
}

/// Root engine configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and caller-supplied overrides with layered precedence. The precedence
/// order (lowest to highest) is: defaults, configuration file, environment
/// variables, overrides.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `--config`
/// 2. Path specified via the `KASSERT_CONFIG_PATH` environment variable
/// 3. `.kassert.toml` in the current working directory
/// 4. `.kassert.toml` in the home directory
/// 5. `~/.config/kassert/config.toml` (XDG default)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "KASSERT",
    post_merge_hook,
    discovery(
        app_name = "kassert",
        env_var = "KASSERT_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".kassert.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct EngineConfig {
    /// Namespace assigned to resources without one.
    #[ortho_config(skip_cli)]
    pub namespace: String,

    /// Render resource documents against the bindings before submission.
    #[ortho_config(skip_cli)]
    pub template: bool,

    /// Leave created resources in place instead of recording cleanup.
    #[ortho_config(skip_cli)]
    pub skip_delete: bool,

    /// Stop a create at the first attempt that finds the object present.
    #[ortho_config(skip_cli)]
    pub fail_fast_on_conflict: bool,

    /// Operation budgets.
    #[ortho_config(skip_cli)]
    pub timeouts: TimeoutsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: String::from(DEFAULT_NAMESPACE),
            template: true,
            skip_delete: false,
            fail_fast_on_conflict: false,
            timeouts: TimeoutsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Operation budgets as durations.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts.to_timeouts()
    }

    /// Build the namespacer for the configured namespace.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::InvalidNamespace`] when the namespace is
    /// not a valid RFC 1123 label.
    pub fn namespacer(&self) -> Result<DefaultNamespacer, NamespaceError> {
        DefaultNamespacer::new(self.namespace.as_str())
    }

    /// Check values that deserialise fine but cannot drive the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an invalid namespace or a
    /// zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.namespacer()
            .map_err(|error| ConfigError::InvalidValue {
                field: String::from("namespace"),
                reason: error.to_string(),
            })?;
        if let Some((field, _)) = self
            .timeouts
            .entries()
            .into_iter()
            .find(|(_, seconds)| *seconds == 0)
        {
            return Err(ConfigError::InvalidValue {
                field: String::from(field),
                reason: String::from("timeout must be at least one second"),
            });
        }
        Ok(())
    }
}

impl PostMergeHook for EngineConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        let trimmed = self.namespace.trim();
        if trimmed.len() != self.namespace.len() {
            self.namespace = String::from(trimmed);
        }
        Ok(())
    }
}
