use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infra::runtime::channel::DEFAULT_MAX_FRAME_BYTES;

pub const DEFAULT_SERVER_NAME: &str = "Calculator MCP Server";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_name: String,
    pub server_version: String,
    pub protocol_version: String,
    pub log_level: String,
    /// Longest accepted request line, in bytes.
    pub max_frame_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.into(),
            server_version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.into(),
            log_level: "info".into(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file named by `MCP_CONFIG` (if set), then
    /// `MCP_SERVER_NAME` / `RUST_LOG` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var("MCP_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            if !name.trim().is_empty() {
                self.server_name = name;
            }
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            if !level.trim().is_empty() {
                self.log_level = level;
            }
        }
    }
}
