use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_EARNINGS_WEEKS: u32 = 8;

/// Longest earnings chart, in weeks.
pub const MAX_EARNINGS_WEEKS: u32 = 104;

/// Environment variable overriding [`PortalConfig::api_base_url`].
pub const ENV_API_BASE_URL: &str = "AGENT_PORTAL_API_URL";
/// Environment variable overriding [`PortalConfig::storage_dir`].
pub const ENV_STORAGE_DIR: &str = "AGENT_PORTAL_STORAGE_DIR";
/// Environment variable overriding [`PortalConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "AGENT_PORTAL_LOG_LEVEL";
/// Environment variable overriding [`PortalConfig::page_size`].
pub const ENV_PAGE_SIZE: &str = "AGENT_PORTAL_PAGE_SIZE";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid for its format.
    #[error("failed to parse configuration file {path}: {message}")]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Parser error.
        message: String,
    },

    /// A file extension or output format other than yaml, json, or toml.
    #[error("unsupported configuration format `{0}`; use yaml, json, or toml")]
    UnsupportedFormat(String),

    /// An `AGENT_PORTAL_*` variable could not be parsed.
    #[error("invalid {key} value `{value}`: {reason}")]
    InvalidEnv {
        /// Variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
        /// Parser error.
        reason: String,
    },

    /// The merged configuration failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Rendering the configuration failed.
    #[error("failed to serialize configuration: {0}")]
    Serialize(String),
}

/// Command-line overrides applied after file and environment layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replaces the API origin.
    pub api_base_url: Option<Url>,
    /// Replaces the session directory.
    pub storage_dir: Option<PathBuf>,
    /// Replaces the log level.
    pub log_level: Option<String>,
}

/// Resolved client configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PortalConfig {
    /// Origin of the Agent Portal API; endpoint paths are joined onto it.
    pub api_base_url: Url,

    /// Directory holding the persisted session slots. `None` means the
    /// platform config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    /// Default tracing level when `RUST_LOG` is unset.
    pub log_level: String,

    /// Job list page size used when no explicit limit is given.
    pub page_size: u32,

    /// Number of weeks shown in the earnings chart.
    pub earnings_weeks: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PortalConfig {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: default_base_url(),
            storage_dir: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            earnings_weeks: DEFAULT_EARNINGS_WEEKS,
        }
    }

    /// Loads the configuration from a file, `AGENT_PORTAL_*` environment
    /// variables, and command-line overrides, in that order.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// value is malformed, or the result fails validation.
    pub fn load_config(
        config_path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, overrides, |key| env::var(key).ok())
    }

    /// [`Self::load_config`] with an explicit environment lookup.
    ///
    /// Environment values only apply to settings the file left at their
    /// defaults.
    ///
    /// # Errors
    /// See [`Self::load_config`].
    pub fn load_with_env<F>(
        config_path: Option<&Path>,
        overrides: ConfigOverrides,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::with_defaults(),
        };
        let defaults = Self::with_defaults();

        if config.api_base_url == defaults.api_base_url {
            if let Some(value) = lookup(ENV_API_BASE_URL) {
                config.api_base_url =
                    Url::parse(&value).map_err(|err| ConfigError::InvalidEnv {
                        key: ENV_API_BASE_URL,
                        value: value.clone(),
                        reason: err.to_string(),
                    })?;
            }
        }
        if config.storage_dir.is_none() {
            if let Some(value) = lookup(ENV_STORAGE_DIR).filter(|value| !value.is_empty()) {
                config.storage_dir = Some(PathBuf::from(value));
            }
        }
        if config.log_level == defaults.log_level {
            if let Some(value) = lookup(ENV_LOG_LEVEL) {
                config.log_level = value;
            }
        }
        if config.page_size == defaults.page_size {
            if let Some(value) = lookup(ENV_PAGE_SIZE) {
                config.page_size = value.parse().map_err(|_| ConfigError::InvalidEnv {
                    key: ENV_PAGE_SIZE,
                    value: value.clone(),
                    reason: "must be a positive number".to_string(),
                })?;
            }
        }

        if let Some(url) = overrides.api_base_url {
            config.api_base_url = url;
        }
        if let Some(dir) = overrides.storage_dir {
            config.storage_dir = Some(dir);
        }
        if let Some(level) = overrides.log_level {
            config.log_level = level;
        }

        config.api_base_url = normalize_base_url(config.api_base_url);
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file, picking the format from its extension.
    ///
    /// # Errors
    /// Returns an error for unreadable files, unknown extensions, or
    /// malformed content.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or_default()
            .to_ascii_lowercase();
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        match extension.as_str() {
            "yaml" | "yml" => serde_yml::from_str(&content).map_err(|e| parse_error(e.to_string())),
            "json" => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
            "toml" => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Render this configuration as `yaml`, `json`, or `toml`.
    ///
    /// # Errors
    /// Returns an error for unknown formats or serializer failures.
    pub fn to_format(&self, format: &str) -> Result<String, ConfigError> {
        match format {
            "yaml" | "yml" => {
                serde_yml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
            }
            "json" => {
                serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
            }
            "toml" => toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string())),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Validate the resolved configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must use http or https, got `{}`",
                self.api_base_url
            )));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid(
                "page_size must be greater than 0".to_string(),
            ));
        }
        if !(1..=MAX_EARNINGS_WEEKS).contains(&self.earnings_weeks) {
            return Err(ConfigError::Invalid(format!(
                "earnings_weeks must be between 1 and {MAX_EARNINGS_WEEKS}, got {}",
                self.earnings_weeks
            )));
        }
        Ok(())
    }

    /// Directory for persisted session slots, falling back to the platform
    /// config directory and finally the working directory.
    #[must_use]
    pub fn session_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            BaseDirs::new().map_or_else(
                || PathBuf::from("./.agent-portal"),
                |dirs| dirs.config_dir().join("agent-portal"),
            )
        })
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).unwrap_or_else(|_| unreachable!("default base URL is valid"))
}

/// Ensure the base URL path ends with `/` so relative joins keep any prefix.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
