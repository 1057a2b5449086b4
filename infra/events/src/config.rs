use crate::error::format_context;
use config::{Config, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

const ENV_PREFIX: &str = "EVENTBUS";
const ENV_SEPARATOR: &str = "__";

/// What the bus does when a listener fails during dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// The first failing listener stops delivery; its error is returned from `publish`.
    /// Panics unwind out of `publish` untouched.
    #[default]
    Abort,
    /// Every listener is attempted. Errors and panics are logged and reported
    /// in the returned [`Delivery`](crate::Delivery).
    Continue,
}

/// Runtime settings of an [`EventBus`](crate::EventBus).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub fault_policy: FaultPolicy,
}

impl BusConfig {
    /// Loads a [`BusConfig`] from `path`, see [`load_config`].
    ///
    /// # Errors
    /// Returns [`ConfigError::Config`] if the file is missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_config(path)
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

pub trait ConfigErrorExt<T> {
    /// Attaches a human-readable context to the error, if any.
    ///
    /// # Errors
    /// Returns the original error converted into [`ConfigError`].
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError>;
}

impl<T> ConfigErrorExt<T> for Result<T, config::ConfigError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

impl From<config::ConfigError> for ConfigError {
    #[inline]
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

/// Layered configuration loader: a required file overlaid with environment variables.
///
/// 1. **Base File**: the format is inferred from the extension (`.toml`, `.json`, `.yaml`, ...).
/// 2. **Environment Overrides**: variables prefixed with `EVENTBUS__`, nested keys joined by
///    double underscores (e.g. `EVENTBUS__FAULT_POLICY=continue`).
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file cannot be found or its content
/// does not match `T`.
///
/// # Example
/// ```rust
/// use eventbus::{BusConfig, load_config};
///
/// let cfg: BusConfig = load_config("config/eventbus.toml").unwrap_or_default();
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path.as_ref(), environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .convert_case(config::Case::Snake)
}

fn load_layered<T>(path: &Path, env: Environment) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    info!("Loading config from {}", path.display());

    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(env)
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
