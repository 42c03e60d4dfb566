//! Configuration management for the command-line tool.
//!
//! Instances are declared in a YAML file:
//!
//! ```yaml
//! apiKey: global-token        # used when an instance has none
//! timeoutSecs: 15
//! instances:
//!   prod:
//!     url: https://cms.example.com
//!     apiKey: prod-token
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "DOCSYNC_CONFIG";

/// Request timeout when the config does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection details of one remote instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Contents of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Token for instances without their own key
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub instances: BTreeMap<String, Instance>,
}

/// Values given on the command line, which win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// Everything needed to reach one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

impl Config {
    /// Load from `$DOCSYNC_CONFIG`, or `~/.config/docsync/config.yaml`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_path()?,
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "loading config");
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.instances.is_empty() {
            return Err(ConfigError::NoInstances);
        }
        Ok(config)
    }

    /// Resolve an instance alias into connection details.
    ///
    /// Overrides win over the instance; the instance key wins over the
    /// global one.
    pub fn connect(&self, alias: &str, overrides: &Overrides) -> Result<Connection, ConfigError> {
        let instance = self
            .instances
            .get(alias)
            .ok_or_else(|| ConfigError::UnknownInstance(alias.to_string()))?;

        let base_url = overrides
            .url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| instance.url.clone());
        if base_url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let token = [&overrides.token, &instance.api_key, &self.api_key]
            .into_iter()
            .flatten()
            .find(|token| !token.is_empty())
            .cloned()
            .ok_or(ConfigError::MissingToken)?;

        let timeout = self
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Connection {
            base_url,
            token,
            timeout,
        })
    }
}

fn default_path() -> Result<PathBuf, ConfigError> {
    let home = env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .ok_or(ConfigError::NoHome)?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("docsync")
        .join("config.yaml"))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(String),

    #[error("no instances defined in config file")]
    NoInstances,

    #[error("instance alias not found in config: {0}")]
    UnknownInstance(String),

    #[error("base URL not provided (flag --url or config)")]
    MissingUrl,

    #[error("API token not provided (flag --token / COCKPIT_TOKEN or config)")]
    MissingToken,

    #[error("HOME is not set; use DOCSYNC_CONFIG to locate the config file")]
    NoHome,
}
