//! Library configuration.
//!
//! ```toml
//! enabled = true
//! types = ["users", "posts"]
//! default_index = "app"
//! silent = false
//! environment = "production"
//!
//! [type_indices]
//! users = "users_index"
//!
//! [[hosts]]
//! host = "localhost"
//! port = 9200
//!
//! [logging]
//! enabled = true
//! ```

use crate::error::Result;
use crate::types::Environment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Search service host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
}

impl HostConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            scheme: default_scheme(),
            user: None,
            pass: None,
        }
    }

    /// Base URL of the host, without trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}

/// Request logging switch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Observe searchable lifecycle events and mirror them into the index
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Declared searchable type names
    #[serde(default)]
    pub types: Vec<String>,
    /// Per-type index overrides
    #[serde(default)]
    pub type_indices: HashMap<String, String>,
    #[serde(default)]
    pub default_index: Option<String>,
    #[serde(default = "default_hosts")]
    pub hosts: Vec<HostConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Suppress non-critical failures (they are still logged)
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub environment: Environment,
    /// Records per bulk request while reindexing
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    9200
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_hosts() -> Vec<HostConfig> {
    vec![HostConfig::default()]
}

fn default_chunk_size() -> usize {
    100
}

fn default_page_size() -> usize {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            types: Vec::new(),
            type_indices: HashMap::new(),
            default_index: None,
            hosts: default_hosts(),
            logging: LoggingConfig::default(),
            silent: false,
            environment: Environment::default(),
            chunk_size: default_chunk_size(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading config from: {}", path.display());

        let raw_config = std::fs::read_to_string(path)?;
        tracing::debug!("Raw config: {}", raw_config);

        Self::from_toml(&raw_config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(crate::error::QuarryError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder pattern for creating configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn type_index(mut self, type_name: impl Into<String>, index: impl Into<String>) -> Self {
        self.config
            .type_indices
            .insert(type_name.into(), index.into());
        self
    }

    pub fn default_index(mut self, index: impl Into<String>) -> Self {
        self.config.default_index = Some(index.into());
        self
    }

    pub fn host(mut self, host: HostConfig) -> Self {
        self.config.hosts = vec![host];
        self
    }

    pub fn logging(mut self, enabled: bool) -> Self {
        self.config.logging.enabled = enabled;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.config.silent = silent;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size.max(1);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
