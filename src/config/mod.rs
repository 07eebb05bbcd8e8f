//! Configuration system for kassert.
//!
//! Engine settings are layered with `ortho_config`: caller overrides take
//! precedence over environment variables, which override configuration
//! files, which override defaults.
//!
//! The configuration file is expected at `~/.config/kassert/config.toml` by
//! default, or `.kassert.toml` in the working or home directory.
//!
//! # Example Configuration
//!
//! ```toml
//! namespace = "e2e"
//! template = true
//! skip_delete = false
//! fail_fast_on_conflict = false
//!
//! [timeouts]
//! apply = 5
//! assert = 30
//! cleanup = 30
//! delete = 15
//! error = 30
//! exec = 5
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::ConfigOverrides;
pub use loader::{CONFIG_PATH_ENV, env_var_names, load_config, load_config_with_env};
pub use types::{DEFAULT_NAMESPACE, EngineConfig, TimeoutsConfig};
