//! Client configuration.
//!
//! Layered the usual way: an optional file named by `GEOCORE_CONFIG`, then
//! `GEOCORE_*` environment variables on top. Unknown keys are rejected.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Static client configuration.
///
/// Every field is optional: a client built from an empty configuration
/// starts unconfigured and must be `setup` before its first request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeocoreConfig {
    pub base_url: Option<String>,
    pub project_id: Option<String>,
    /// Identifies this installation when deriving the default user.
    pub device_id: Option<String>,
    /// Request timeout handed to the transport, in seconds.
    pub timeout_secs: Option<u64>,
}

impl GeocoreConfig {
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            project_id: Some(project_id.into()),
            ..Self::default()
        }
    }

    /// Load from the file named by `GEOCORE_CONFIG` (if set), then apply
    /// `GEOCORE_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Ok(config_path) = std::env::var("GEOCORE_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path));
        }
        builder = builder.add_source(Environment::with_prefix("GEOCORE"));

        builder.build()?.try_deserialize()
    }
}
