//! Configuration management for `asset_bridge`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (seeded from `.env` when present)
//! 3. Config file (`--config`, or `./asset-bridge.yaml`)
//! 4. Defaults
//!
//! Keys are normalized so `destination.asset-endpoint`,
//! `destination_asset_endpoint` and `ASSET_BRIDGE_DESTINATION_ASSET_ENDPOINT`
//! all address the same value.

use crate::error::{BridgeError, Result};
use crate::source::DEFAULT_PAGE_SIZE;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILENAME: &str = "asset-bridge.yaml";
/// Prefix for generic environment overrides.
const ENV_PREFIX: &str = "ASSET_BRIDGE_";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RATE_LIMIT_DELAY_SECS: u64 = 60;
const DEFAULT_EXPORT_DIR: &str = "exports";

/// Environment names used by existing `.env` files, mapped to config keys.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("JIRA_URL", "source.url"),
    ("JIRA_PAT", "source.token"),
    ("CLOUD_URL", "destination.url"),
    ("CLOUD_EMAIL", "destination.email"),
    ("CLOUD_TOKEN", "destination.token"),
    ("ASSET_ENDPOINT", "destination.asset-endpoint"),
];

/// A flat configuration layer (normalized key -> raw string value).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Insert a value under its normalized key.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize_key(key))
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.insert(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from `(name, value)` pairs shaped like environment variables.
    #[must_use]
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        let mut prefixed = Vec::new();

        for (name, value) in vars {
            if let Some(stripped) = name.strip_prefix(ENV_PREFIX) {
                prefixed.push((stripped.to_string(), value));
            } else if let Some((_, key)) = LEGACY_ENV_KEYS.iter().find(|(env, _)| *env == name) {
                layer.insert(key, value);
            }
        }

        // Explicit ASSET_BRIDGE_* names beat the legacy names.
        for (key, value) in prefixed {
            layer.insert(&key, value);
        }

        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub page_size: Option<usize>,
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub rate_limit_delay_secs: Option<u64>,
    pub max_failure_rate: Option<f64>,
    pub export_dir: Option<PathBuf>,
    pub quiet: bool,
    pub json: bool,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(page_size) = self.page_size {
            layer.insert("page-size", page_size.to_string());
        }
        if let Some(workers) = self.workers {
            layer.insert("workers", workers.to_string());
        }
        if let Some(timeout) = self.timeout_secs {
            layer.insert("timeout-secs", timeout.to_string());
        }
        if let Some(delay) = self.rate_limit_delay_secs {
            layer.insert("rate-limit-delay-secs", delay.to_string());
        }
        if let Some(rate) = self.max_failure_rate {
            layer.insert("max-failure-rate", rate.to_string());
        }
        if let Some(dir) = &self.export_dir {
            layer.insert("export-dir", dir.to_string_lossy().to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert("page-size", DEFAULT_PAGE_SIZE.to_string());
    layer.insert("workers", default_workers().to_string());
    layer.insert("timeout-secs", DEFAULT_TIMEOUT_SECS.to_string());
    layer.insert(
        "rate-limit-delay-secs",
        DEFAULT_RATE_LIMIT_DELAY_SECS.to_string(),
    );
    layer.insert("max-failure-rate", "0");
    layer.insert("export-dir", DEFAULT_EXPORT_DIR);
    layer
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Load configuration with the full precedence chain.
///
/// A `.env` file in the working directory seeds the process environment
/// first; variables already set in the environment are left untouched.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if an
/// explicitly requested config file does not exist.
pub fn load_config(config_path: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => return Err(BridgeError::Config(format!("failed to read .env: {err}"))),
    }

    let file_layer = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(BridgeError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            ConfigLayer::from_yaml(path)?
        }
        None => ConfigLayer::from_yaml(Path::new(DEFAULT_CONFIG_FILENAME))?,
    };

    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        file_layer,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Connection settings for the self-hosted source tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub url: String,
    pub token: String,
}

/// Connection settings for the cloud destination tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSettings {
    pub url: String,
    pub email: String,
    pub token: String,
    pub asset_endpoint: String,
}

/// Validated run settings. Tracker credentials are validated on demand so a
/// command touching only one tracker does not need the other's secrets.
#[derive(Debug, Clone)]
pub struct Settings {
    pub page_size: usize,
    pub workers: usize,
    pub timeout: Duration,
    pub rate_limit_delay: Duration,
    pub max_failure_rate: f64,
    pub export_dir: PathBuf,
    layer: ConfigLayer,
}

impl Settings {
    /// Validate a merged layer.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a numeric value is unparsable or out of range.
    pub fn from_layer(layer: ConfigLayer) -> Result<Self> {
        let page_size: usize = parse_required(&layer, "page-size")?;
        if page_size == 0 {
            return Err(BridgeError::Config("page-size must be at least 1".to_string()));
        }
        let workers: usize = parse_required(&layer, "workers")?;
        if workers == 0 {
            return Err(BridgeError::Config("workers must be at least 1".to_string()));
        }
        let timeout_secs: u64 = parse_required(&layer, "timeout-secs")?;
        if timeout_secs == 0 {
            return Err(BridgeError::Config("timeout-secs must be at least 1".to_string()));
        }
        let delay_secs: u64 = parse_required(&layer, "rate-limit-delay-secs")?;
        let max_failure_rate: f64 = parse_required(&layer, "max-failure-rate")?;
        if !(0.0..=1.0).contains(&max_failure_rate) {
            return Err(BridgeError::Config(format!(
                "max-failure-rate must be between 0 and 1, got {max_failure_rate}"
            )));
        }
        let export_dir = PathBuf::from(require(&layer, "export-dir")?);

        Ok(Self {
            page_size,
            workers,
            timeout: Duration::from_secs(timeout_secs),
            rate_limit_delay: Duration::from_secs(delay_secs),
            max_failure_rate,
            export_dir,
            layer,
        })
    }

    /// Source tracker URL and personal access token.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first missing key.
    pub fn source(&self) -> Result<SourceSettings> {
        Ok(SourceSettings {
            url: base_url(&self.layer, "source.url")?,
            token: require(&self.layer, "source.token")?.to_string(),
        })
    }

    /// Destination site URL, account, token and asset lookup endpoint.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first missing key.
    pub fn destination(&self) -> Result<DestinationSettings> {
        Ok(DestinationSettings {
            url: base_url(&self.layer, "destination.url")?,
            email: require(&self.layer, "destination.email")?.to_string(),
            token: require(&self.layer, "destination.token")?.to_string(),
            asset_endpoint: base_url(&self.layer, "destination.asset-endpoint")?,
        })
    }
}

fn require<'a>(layer: &'a ConfigLayer, key: &str) -> Result<&'a str> {
    layer.get(key).map(str::trim).ok_or_else(|| {
        let hint = LEGACY_ENV_KEYS
            .iter()
            .find(|(_, k)| *k == key)
            .map_or_else(String::new, |(env, _)| format!(" (env {env})"));
        BridgeError::Config(format!("missing required setting {key}{hint}"))
    })
}

fn parse_required<T: std::str::FromStr>(layer: &ConfigLayer, key: &str) -> Result<T> {
    let raw = require(layer, key)?;
    raw.parse::<T>()
        .map_err(|_| BridgeError::Config(format!("invalid value for {key}: {raw}")))
}

fn base_url(layer: &ConfigLayer, key: &str) -> Result<String> {
    let raw = require(layer, key)?;
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(BridgeError::Config(format!(
            "{key} must be an http(s) URL, got {raw}"
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '.'], "-")
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
