// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network configuration: where the joiner connects and which port the
//! host binds. Loading never fails; a missing or unparseable file
//! falls back to the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetConfig {
    /// Address the joiner connects to
    #[serde(default = "default_opponent_ip")]
    pub opponent_ip: String,
    /// Port the host binds and the joiner targets
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_opponent_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    54321
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            opponent_ip: default_opponent_ip(),
            port: default_port(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let proj_dirs =
        ProjectDirs::from("io", "tacnet", "tacnet").context("failed to determine config directory")?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Load the configuration from the default location, falling back to
/// the defaults on any failure.
pub fn load_config() -> NetConfig {
    match config_path() {
        Ok(path) => load_config_from(&path),
        Err(e) => {
            tracing::warn!(error = %e, "no config directory, using defaults");
            NetConfig::default()
        }
    }
}

/// Load the configuration from a specific file.
pub fn load_config_from(path: &Path) -> NetConfig {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return NetConfig::default();
        }
    };

    match toml::from_str::<NetConfig>(&content) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not parse config, using defaults");
            NetConfig::default()
        }
    }
}

/// Write the configuration to the default location.
pub fn save_config(config: &NetConfig) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    let toml_content = toml::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(&path, toml_content)
        .with_context(|| format!("failed to write config file: {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let config = NetConfig::default();
        assert_eq!(config.opponent_ip, "127.0.0.1");
        assert_eq!(config.port, 54321);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.toml"));
        assert_eq!(config, NetConfig::default());
    }

    #[test]
    fn unparseable_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "port = \"not a number\"\n").unwrap();
        assert_eq!(load_config_from(&path), NetConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "opponent_ip = \"192.168.1.20\"\n").unwrap();
        let config = load_config_from(&path);
        assert_eq!(config.opponent_ip, "192.168.1.20");
        assert_eq!(config.port, 54321);
    }

    #[test]
    fn config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = NetConfig {
            opponent_ip: "10.0.0.7".to_string(),
            port: 6000,
        };
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(load_config_from(&path), config);
    }
}
