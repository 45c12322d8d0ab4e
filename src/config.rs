use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::branding::Branding;

/// Optional site config file, read from the working directory.
pub const CONFIG_FILE: &str = "folio.toml";

const PLACEHOLDER_HOST: &str = "placeholder-project.supabase.co";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {0}: {1}")]
    Read(String, std::io::Error),
    #[error("invalid folio.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown data mode '{0}' (expected true/json, auto/false, or remote)")]
    Mode(String),
}

/// Where public pages read their records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataMode {
    /// Static JSON only; the hosted store is never contacted.
    Json,
    /// Hosted store first, static JSON when it fails.
    #[default]
    Auto,
    /// Hosted store only; failures reach the caller.
    Remote,
}

impl FromStr for DataMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "json" => Ok(DataMode::Json),
            "" | "auto" | "false" => Ok(DataMode::Auto),
            "remote" | "supabase" => Ok(DataMode::Remote),
            other => Err(ConfigError::Mode(other.to_string())),
        }
    }
}

impl TryFrom<String> for DataMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataMode> for String {
    fn from(mode: DataMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataMode::Json => "json",
            DataMode::Auto => "auto",
            DataMode::Remote => "remote",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    pub bucket: String,
    /// Per-request limit for the hosted APIs, in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: String::new(),
            anon_key: String::new(),
            bucket: "assets".to_string(),
            timeout_secs: 8,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// A usable project URL (http/https, not the placeholder) plus an anon key.
    pub fn is_configured(&self) -> bool {
        if self.anon_key.trim().is_empty() || !self.url.starts_with("http") {
            return false;
        }
        match url::Url::parse(&self.url) {
            Ok(u) => {
                matches!(u.scheme(), "http" | "https")
                    && u.host_str().is_some_and(|h| h != PLACEHOLDER_HOST)
            }
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub data_mode: DataMode,
    pub static_dir: PathBuf,
    pub remote: RemoteConfig,
    /// Trust `X-Forwarded-For` and friends for the client address. Only
    /// enable behind a proxy that overwrites them.
    pub trusted_proxy: bool,
    /// Used when the hosted settings row can't be read.
    pub branding: Branding,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            data_mode: DataMode::Auto,
            static_dir: PathBuf::from("website/database"),
            remote: RemoteConfig::default(),
            trusted_proxy: false,
            branding: Branding::default(),
        }
    }
}

impl SiteConfig {
    /// `folio.toml` (if present) with environment overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let text = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Read(path.display().to_string(), e))?,
            )
        } else {
            None
        };
        Self::from_sources(text.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources(
        toml_text: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: SiteConfig = match toml_text {
            Some(text) => toml::from_str(text)?,
            None => SiteConfig::default(),
        };

        if let Some(mode) = env("FOLIO_DATA_MODE") {
            config.data_mode = mode.parse()?;
        }
        if let Some(url) = env("SUPABASE_URL") {
            config.remote.url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(key) = env("SUPABASE_ANON_KEY") {
            config.remote.anon_key = key.trim().to_string();
        }
        if let Some(bucket) = env("FOLIO_BUCKET").filter(|b| !b.trim().is_empty()) {
            config.remote.bucket = bucket.trim().to_string();
        }
        if let Some(secs) = env("FOLIO_REMOTE_TIMEOUT").and_then(|s| s.trim().parse().ok()) {
            config.remote.timeout_secs = secs;
        }
        if let Some(flag) = env("FOLIO_TRUSTED_PROXY") {
            config.trusted_proxy = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(dir) = env("FOLIO_STATIC_DIR").filter(|d| !d.trim().is_empty()) {
            config.static_dir = PathBuf::from(dir);
        }
        config.remote.url = config.remote.url.trim_end_matches('/').to_string();
        Ok(config)
    }
}
