//! Configuration Loader
//!
//! Layered loading of [`DispatcherConfig`]: built-in defaults, then an
//! optional TOML file, then environment variables with the `DISPATCH_`
//! prefix. Later layers override earlier ones.

use super::error::{ConfigResult, ConfigurationError};
use super::{parse_max_size, DispatcherConfig};
use crate::constants::system;
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builder for layered configuration loading
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    file_required: bool,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            file: None,
            file_required: false,
            env_prefix: system::ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a TOML file if it exists
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self.file_required = false;
        self
    }

    /// Read a TOML file and fail if it is missing
    pub fn with_required_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self.file_required = true;
        self
    }

    /// Override the environment variable prefix (default `DISPATCH`)
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> ConfigResult<DispatcherConfig> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            debug!(
                path = %path.display(),
                required = self.file_required,
                "Adding configuration file source"
            );
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(self.file_required),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let merged = builder.build()?;
        let config = DispatcherConfig {
            event_queue_max_size: Self::max_size_from(&merged)?,
        };
        config.validate()?;

        debug!(
            event_queue_max_size = ?config.event_queue_max_size,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    /// `event_queue_max_size` accepts an integer, or an empty / `none` string
    fn max_size_from(merged: &Config) -> ConfigResult<Option<usize>> {
        const KEY: &str = "event_queue_max_size";

        match merged.get::<Option<i64>>(KEY) {
            Ok(None) => Ok(None),
            Ok(Some(size)) => usize::try_from(size).map(Some).map_err(|_| {
                ConfigurationError::invalid_value(KEY, size.to_string(), "must not be negative")
            }),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(_) => {
                let raw: String = merged.get(KEY)?;
                parse_max_size(KEY, &raw)
            }
        }
    }
}
