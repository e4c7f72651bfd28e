use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::services::ServiceConfig;
use crate::infrastructure::FsStoreConfig;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "FORECAST_CONFIG";

const HOST_ENV: &str = "FORECAST_SERVICE_HOST";
const PORT_ENV: &str = "FORECAST_SERVICE_PORT";
const MODELS_DIR_ENV: &str = "FORECAST_MODELS_DIR";
const MAX_COMBINATIONS_ENV: &str = "FORECAST_MAX_COMBINATIONS";
const TIMEOUT_ENV: &str = "FORECAST_PREDICT_TIMEOUT_MS";
const MAX_ARTIFACT_BYTES_ENV: &str = "FORECAST_MAX_ARTIFACT_BYTES";
const CACHE_ENV: &str = "FORECAST_CACHE_ARTIFACTS";
const MAX_CONCURRENT_ENV: &str = "FORECAST_MAX_CONCURRENT_PREDICTIONS";

/// Complete runtime configuration of the forecast service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSettings {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub max_combinations: usize,
    pub predict_timeout_ms: u64,
    pub max_artifact_bytes: u64,
    pub cache_artifacts: bool,
    /// Upper bound on loads/predictions running at once, timed-out ones included.
    pub max_concurrent_predictions: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            models_dir: PathBuf::from("./models"),
            max_combinations: 100_000,
            predict_timeout_ms: 30_000,
            max_artifact_bytes: 64 * 1024 * 1024,
            cache_artifacts: false,
            max_concurrent_predictions: 16,
        }
    }
}

impl ServiceSettings {
    /// Defaults, then the file named by `FORECAST_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same layering as [`ServiceSettings::load`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(host) = lookup(HOST_ENV) {
            settings.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            settings.port = parse_var(PORT_ENV, &port)?;
        }
        if let Some(dir) = lookup(MODELS_DIR_ENV) {
            settings.models_dir = PathBuf::from(dir);
        }
        if let Some(max) = lookup(MAX_COMBINATIONS_ENV) {
            settings.max_combinations = parse_var(MAX_COMBINATIONS_ENV, &max)?;
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            settings.predict_timeout_ms = parse_var(TIMEOUT_ENV, &timeout)?;
        }
        if let Some(bytes) = lookup(MAX_ARTIFACT_BYTES_ENV) {
            settings.max_artifact_bytes = parse_var(MAX_ARTIFACT_BYTES_ENV, &bytes)?;
        }
        if let Some(cache) = lookup(CACHE_ENV) {
            settings.cache_artifacts = parse_var(CACHE_ENV, &cache)?;
        }
        if let Some(limit) = lookup(MAX_CONCURRENT_ENV) {
            settings.max_concurrent_predictions = parse_var(MAX_CONCURRENT_ENV, &limit)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Read a JSON settings file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_combinations == 0 {
            bail!("max_combinations must be greater than zero");
        }
        if self.predict_timeout_ms == 0 {
            bail!("predict_timeout_ms must be greater than zero");
        }
        if self.max_artifact_bytes == 0 {
            bail!("max_artifact_bytes must be greater than zero");
        }
        if self.max_concurrent_predictions == 0 {
            bail!("max_concurrent_predictions must be greater than zero");
        }
        if self.host.is_empty() || self.host.chars().any(char::is_whitespace) {
            bail!("invalid host {:?}", self.host);
        }
        Ok(())
    }

    /// Resolve `host:port` to the address to bind. `host` may be an IP
    /// literal or a name such as `localhost`; the first resolved address wins.
    pub async fn resolve_bind_addr(&self) -> Result<SocketAddr> {
        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("failed to resolve {}:{}", self.host, self.port))?;
        addrs
            .next()
            .ok_or_else(|| anyhow!("{}:{} resolved to no addresses", self.host, self.port))
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_millis(self.predict_timeout_ms)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::new(self.max_combinations)
    }

    pub fn store_config(&self) -> FsStoreConfig {
        FsStoreConfig {
            max_artifact_bytes: self.max_artifact_bytes,
            cache_artifacts: self.cache_artifacts,
        }
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err| anyhow!("invalid value for {key} ({raw:?}): {err}"))
}
