//! Server configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via FILEPOOL_CONFIG or --config)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Worker pool configuration.
    pub pool: PoolConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("FILEPOOL_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.network.apply_env_overrides();
        self.pool.apply_env_overrides();
        self.storage.apply_env_overrides();
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.size == 0 {
            return Err(ConfigError::ValidationError(
                "pool.size must be a positive integer".to_string(),
            ));
        }
        if self.storage.chunk_kb == 0 {
            return Err(ConfigError::ValidationError(
                "storage.chunk_kb must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind to.
    #[serde(with = "socket_addr_serde")]
    pub bind_addr: SocketAddr,
    /// Listen backlog for the accepting socket.
    pub listen_backlog: i32,
    /// Per-read socket timeout in seconds (0 = no timeout).
    pub read_timeout_secs: u64,
    /// Cap on a buffered partial frame in megabytes (0 = unbounded).
    pub max_frame_mb: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], filepool_protocol::DEFAULT_PORT)),
            listen_backlog: 128,
            read_timeout_secs: 1800,
            max_frame_mb: 0, // unbounded, matching the wire contract
        }
    }
}

impl NetworkConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("FILEPOOL_BIND") {
            if let Ok(parsed) = addr.parse() {
                self.bind_addr = parsed;
            }
        }

        if let Ok(backlog) = std::env::var("FILEPOOL_BACKLOG") {
            if let Ok(n) = backlog.parse() {
                self.listen_backlog = n;
            }
        }

        if let Ok(timeout) = std::env::var("FILEPOOL_READ_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.read_timeout_secs = secs;
            }
        }

        if let Ok(max) = std::env::var("FILEPOOL_MAX_FRAME_MB") {
            if let Ok(mb) = max.parse() {
                self.max_frame_mb = mb;
            }
        }
    }

    /// Returns the read timeout, if one is configured.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }

    /// Returns the partial-frame cap in bytes, if one is configured.
    pub fn max_frame_bytes(&self) -> Option<usize> {
        (self.max_frame_mb > 0).then(|| self.max_frame_mb * 1024 * 1024)
    }
}

/// Worker execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Workers are tasks sharing one process; a semaphore bounds concurrency.
    #[default]
    Thread,
    /// Workers are isolated processes sharing the port via SO_REUSEPORT.
    Process,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "thread" | "threads" => Ok(ExecutionMode::Thread),
            "process" | "processes" => Ok(ExecutionMode::Process),
            other => Err(format!("unknown execution mode: {:?}", other)),
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Thread => write!(f, "thread"),
            ExecutionMode::Process => write!(f, "process"),
        }
    }
}

/// Worker pool configuration, fixed for the server's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of workers serving connections concurrently.
    pub size: usize,
    /// Execution mode.
    pub mode: ExecutionMode,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 1,
            mode: ExecutionMode::Thread,
        }
    }
}

impl PoolConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(size) = std::env::var("FILEPOOL_POOL_SIZE") {
            if let Ok(n) = size.parse() {
                self.size = n;
            }
        }

        if let Ok(mode) = std::env::var("FILEPOOL_POOL_MODE") {
            if let Ok(parsed) = mode.parse() {
                self.mode = parsed;
            }
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage root directory.
    pub root: PathBuf,
    /// Maximum chunk size for encoded download payloads, in kilobytes.
    pub chunk_kb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./storage"),
            chunk_kb: filepool_protocol::DEFAULT_CHUNK_BYTES / 1024,
        }
    }
}

impl StorageConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FILEPOOL_DATA") {
            self.root = PathBuf::from(dir);
        }

        if let Ok(size) = std::env::var("FILEPOOL_CHUNK_KB") {
            if let Ok(kb) = size.parse() {
                self.chunk_kb = kb;
            }
        }
    }

    /// Returns the maximum chunk size in bytes.
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_kb * 1024
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Custom serde module for SocketAddr (to handle as string in YAML).
mod socket_addr_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::net::SocketAddr;

    pub fn serialize<S>(addr: &SocketAddr, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.bind_addr.port(), 6667);
        assert_eq!(config.pool.size, 1);
        assert_eq!(config.pool.mode, ExecutionMode::Thread);
        assert_eq!(config.storage.chunk_bytes(), 64 * 1024);
        assert!(config.network.max_frame_bytes().is_none());
        assert_eq!(
            config.network.read_timeout(),
            Some(Duration::from_secs(1800))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_pool() {
        let mut config = Config::default();
        config.pool.size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_read_timeout_disables_it() {
        let mut config = Config::default();
        config.network.read_timeout_secs = 0;
        assert!(config.network.read_timeout().is_none());
    }

    #[test]
    fn test_execution_mode_parsing() {
        assert_eq!(
            "process".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Process
        );
        assert_eq!(
            "THREADS".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Thread
        );
        assert!("fiber".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = Config::default();
        config.pool.size = 4;
        config.pool.mode = ExecutionMode::Process;
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.network.bind_addr, config.network.bind_addr);
        assert_eq!(parsed.pool.size, 4);
        assert_eq!(parsed.pool.mode, ExecutionMode::Process);
    }
}
