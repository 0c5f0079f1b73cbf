use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_STATS_FILE: &str = "statistics.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_ADDR is not a socket address: {0}")]
    InvalidBindAddr(String),

    #[error("STATS_ENABLED must be true/false, got {0:?}")]
    InvalidFlag(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub stats_file: PathBuf,
    pub stats_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr.clone()))?;

        let stats_file = lookup("STATS_FILE")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATS_FILE.to_string());

        let stats_enabled = match lookup("STATS_ENABLED") {
            None => true,
            Some(flag) => parse_flag(&flag).ok_or(ConfigError::InvalidFlag(flag))?,
        };

        Ok(Self {
            bind_addr,
            stats_file: PathBuf::from(stats_file),
            stats_enabled,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.stats_file, PathBuf::from("statistics.json"));
        assert!(config.stats_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("STATS_FILE", "/tmp/stats.json"),
            ("STATS_ENABLED", "off"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.stats_file, PathBuf::from("/tmp/stats.json"));
        assert!(!config.stats_enabled);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("BIND_ADDR", "localhost")]),
            Err(ConfigError::InvalidBindAddr(_))
        ));
        assert!(matches!(
            config(&[("STATS_ENABLED", "maybe")]),
            Err(ConfigError::InvalidFlag(_))
        ));
    }
}
