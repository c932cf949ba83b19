//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/i3dist/config.json`.
//! Every section is optional so the file can grow new sections later
//! without breaking older ones.
//!
//! # Example
//!
//! ```json
//! {
//!   "distributor": {
//!     "interval_ms": 15000,
//!     "failure_threshold": 5
//!   },
//!   "ipc": {
//!     "timeout_ms": 2000,
//!     "socket_path": "/run/user/1000/i3/ipc-socket.1234"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional — a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Redistribution loop settings.
    #[serde(default)]
    pub distributor: DistributorConfig,

    /// Window-manager IPC settings.
    #[serde(default)]
    pub ipc: IpcConfig,
}

/// Redistribution loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributorConfig {
    /// Time between periodic passes (ms).  Default: `15000`.
    pub interval_ms: u64,
    /// Consecutive failed passes before giving up.  Default: `5`.
    pub failure_threshold: u32,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 15_000,
            failure_threshold: 5,
        }
    }
}

impl DistributorConfig {
    /// Periodic pass interval, never shorter than 1 ms.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// Failure threshold, never below 1.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold.max(1)
    }
}

/// Window-manager IPC settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Read/write timeout for each request (ms).  `0` waits forever.
    /// Default: `2000`.
    pub timeout_ms: u64,
    /// Explicit IPC socket path.  When unset, `$I3SOCK` and then
    /// `$SWAYSOCK` are used.
    pub socket_path: Option<PathBuf>,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            socket_path: None,
        }
    }
}

impl IpcConfig {
    /// Per-request timeout, or `None` to block indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "distributor": {
                "interval_ms": 5000,
                "failure_threshold": 3
            },
            "ipc": {
                "timeout_ms": 500,
                "socket_path": "/tmp/i3.sock"
            }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.distributor.interval(), Duration::from_secs(5));
        assert_eq!(cfg.distributor.failure_threshold(), 3);
        assert_eq!(cfg.ipc.timeout(), Some(Duration::from_millis(500)));
        assert_eq!(cfg.ipc.socket_path, Some(PathBuf::from("/tmp/i3.sock")));
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.distributor.interval(), Duration::from_secs(15));
        assert_eq!(cfg.distributor.failure_threshold(), 5);
        assert_eq!(cfg.ipc.timeout(), Some(Duration::from_secs(2)));
        assert!(cfg.ipc.socket_path.is_none());
    }

    #[test]
    fn deserialize_partial_distributor() {
        let json = r#"{ "distributor": { "failure_threshold": 8 } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.distributor.failure_threshold(), 8);
        assert_eq!(cfg.distributor.interval_ms, DistributorConfig::default().interval_ms);
    }

    #[test]
    fn zero_values_are_clamped_or_disable() {
        let json = r#"{
            "distributor": { "interval_ms": 0, "failure_threshold": 0 },
            "ipc": { "timeout_ms": 0 }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.distributor.interval(), Duration::from_millis(1));
        assert_eq!(cfg.distributor.failure_threshold(), 1);
        assert_eq!(cfg.ipc.timeout(), None);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "distributor": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("i3dist-test-no-such-config.json");
        assert!(Config::load(&path).is_err());
    }
}
