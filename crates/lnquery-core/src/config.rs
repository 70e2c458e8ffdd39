//! Configuration management.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, HealthCriteria, Result};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Docker socket path.
    #[serde(default)]
    pub docker_socket: Option<String>,
    /// Answer from the built-in sample node instead of a live one.
    #[serde(default = "default_use_mock")]
    pub use_mock_data: bool,
    /// Live node connection settings.
    #[serde(default)]
    pub node: NodeConfig,
    /// Health band applied to every query.
    #[serde(default)]
    pub health: HealthCriteria,
}

/// How to reach the live LND node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Docker container running lnd.
    pub container: String,
    /// lnd RPC host, as seen from inside the container.
    pub rpc_host: String,
    /// lnd RPC port.
    pub rpc_port: u16,
    /// TLS certificate path inside the container.
    pub tls_cert_path: String,
    /// Macaroon path inside the container.
    pub macaroon_path: String,
    /// Bitcoin network (e.g., "regtest", "mainnet").
    pub network: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            container: "lnd".to_string(),
            rpc_host: "localhost".to_string(),
            rpc_port: 10009,
            tls_cert_path: "/home/lnd/.lnd/tls.cert".to_string(),
            macaroon_path: "/home/lnd/.lnd/data/chain/bitcoin/regtest/admin.macaroon"
                .to_string(),
            network: "regtest".to_string(),
        }
    }
}

impl NodeConfig {
    /// `host:port` passed to `lncli --rpcserver`.
    pub fn rpc_server(&self) -> String {
        format!("{}:{}", self.rpc_host, self.rpc_port)
    }
}

const fn default_use_mock() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker_socket: None,
            use_mock_data: default_use_mock(),
            node: NodeConfig::default(),
            health: HealthCriteria::default(),
        }
    }
}

impl Config {
    /// Load configuration from disk or create default, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::read(&config_path)?
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            config
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.health.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.health.validate()?;
        Ok(config)
    }

    /// Save configuration to the given path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("wrote config to {}", path.display());
        Ok(())
    }

    /// Apply `LNQUERY_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LNQUERY_USE_MOCK") {
            self.use_mock_data = parse_bool(&value).ok_or_else(|| {
                Error::Config(format!("LNQUERY_USE_MOCK must be a boolean, got '{value}'"))
            })?;
        }
        if let Some(value) = lookup("LNQUERY_LND_CONTAINER") {
            self.node.container = value;
        }
        if let Some(value) = lookup("LNQUERY_LND_HOST") {
            self.node.rpc_host = value;
        }
        if let Some(value) = lookup("LNQUERY_LND_PORT") {
            self.node.rpc_port = value.parse().map_err(|_| {
                Error::Config(format!("LNQUERY_LND_PORT must be a port number, got '{value}'"))
            })?;
        }
        if let Some(value) = lookup("LNQUERY_TLS_CERT_PATH") {
            self.node.tls_cert_path = value;
        }
        if let Some(value) = lookup("LNQUERY_MACAROON_PATH") {
            self.node.macaroon_path = value;
        }
        if let Some(value) = lookup("LNQUERY_NETWORK") {
            self.node.network = value;
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Get configuration file path.
    fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "lnquery")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .ok_or_else(|| Error::Config("could not determine config directory".into()))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
