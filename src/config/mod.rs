//! Configuration management for the tracer.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base (including the reference field table)
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod channel;
mod fields;
mod monitoring;
pub use channel::*;
pub use fields::*;
pub use monitoring::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Prefix of environment variables overriding configuration keys,
/// e.g. `TRACER__CHANNEL__CAPACITY`
pub const ENV_PREFIX: &str = "TRACER";

/// Main configuration container for the tracer
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone)]
pub struct TracerConfig {
    /// Traced field table; position in the list is the field index
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldSpec>,
    /// Event channel sizing and publish policy
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Metrics exposition settings
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Debug for TracerConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TracerConfig")
            .field("fields", &self.fields.len())
            .field("channel", &self.channel)
            .field("monitoring", &self.monitoring)
            .finish()
    }
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            channel: ChannelConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl TracerConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `TRACER__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so further overrides can be applied with
    /// `with_override_config()`. Callers MUST call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/tracer.toml");
    /// std::env::set_var("TRACER__CHANNEL__CAPACITY", "4096");
    /// let cfg = TracerConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    ///
    /// # Errors
    /// - Field table problems surface as `Error::Registry`
    /// - Channel and monitoring problems surface as `Error::InvalidConfig`
    pub fn validate(self) -> Result<Self> {
        validate_fields(&self.fields)?;
        self.channel.validate()?;
        self.monitoring.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
