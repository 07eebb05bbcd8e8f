//! Command-line overrides for embedding CLIs.

use camino::Utf8PathBuf;
use clap::Args;

/// Flags an embedding CLI can flatten into its own parser.
///
/// Values given here take precedence over every other configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ConfigOverrides {
    /// Path to configuration file.
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Namespace assigned to resources without one.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Leave created resources in place after the run.
    #[arg(long)]
    pub skip_delete: bool,
}
