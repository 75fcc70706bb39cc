//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use venue_codes::CodeConfig;

use crate::{LogFormat, NodeError};

/// Configuration for a venue-code node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Whether to serve the REST API.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// Interface the REST server binds to.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// REST server port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Whether the node runs the periodic expiry sweep itself. Disable when
    /// an external scheduler calls the sweep endpoint instead.
    #[serde(default = "default_true")]
    pub enable_sweeper: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to expose the Prometheus metrics endpoint.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Venue-code policy.
    #[serde(default)]
    pub codes: CodeConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./venue_data")
}

fn default_map_size_mb() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    8080
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// LMDB map size in bytes.
    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Parsed log format; unknown values fall back to human output.
    pub fn log_format(&self) -> LogFormat {
        self.log_format.parse().unwrap_or(LogFormat::Human)
    }

    /// Reject settings the node cannot start with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.map_size_mb == 0 {
            return Err(NodeError::Config("map_size_mb must be > 0".into()));
        }
        self.codes
            .validate()
            .map_err(|e| NodeError::Config(e.to_string()))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            enable_rpc: true,
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            enable_sweeper: true,
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            codes: CodeConfig::default(),
        }
    }
}
