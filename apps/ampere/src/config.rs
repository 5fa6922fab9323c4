//! # Configuration
//!
//! Settings for the CLI and the HTTP server, layered from lowest to highest
//! precedence:
//!
//! 1. Built-in defaults
//! 2. `ampere.toml` (optional; a missing file is not an error)
//! 3. Environment variables `AMPERE_HOST`, `AMPERE_PORT`, `AMPERE_SCHEMATIC`
//! 4. Command-line flags
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 9000
//!
//! [schematic]
//! path = "circuits/bench.json"
//! ```

use ampere_core::AmpereError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest configuration file accepted (64 KiB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// `[schematic]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchematicConfig {
    pub path: PathBuf,
}

impl Default for SchematicConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("schematic.json"),
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub schematic: SchematicConfig,
}

impl Config {
    /// Parse a TOML document. Missing tables and keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, AmpereError> {
        toml::from_str(text).map_err(|e| AmpereError::DeserializationError(e.to_string()))
    }

    /// Load `path` if it exists, otherwise start from defaults.
    pub fn load(path: &Path) -> Result<Self, AmpereError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let size = std::fs::metadata(path)
            .map_err(|e| AmpereError::IoError(format!("Cannot read config metadata: {}", e)))?
            .len();
        if size > MAX_CONFIG_FILE_SIZE {
            return Err(AmpereError::LimitExceeded(format!(
                "config file is {} bytes, maximum is {}",
                size, MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| AmpereError::IoError(format!("Read config: {}", e)))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply `AMPERE_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored
    /// with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("AMPERE_HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("AMPERE_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid AMPERE_PORT"),
            }
        }
        if let Some(path) = lookup("AMPERE_SCHEMATIC").filter(|p| !p.is_empty()) {
            self.schematic.path = PathBuf::from(path);
        }
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.schematic.path, PathBuf::from("schematic.json"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml("[server]\nport = 9000\n").expect("parse");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.schematic, SchematicConfig::default());
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            Config::from_toml("[server\nport = "),
            Err(AmpereError::DeserializationError(_))
        ));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::from_toml("[server]\nhost = \"0.0.0.0\"\nport = 1\n").expect("parse");
        let env: HashMap<&str, &str> = [("AMPERE_PORT", "7000"), ("AMPERE_SCHEMATIC", "x.json")]
            .into_iter()
            .collect();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.bind_address(), "0.0.0.0:7000");
        assert_eq!(config.schematic.path, PathBuf::from("x.json"));
    }

    #[test]
    fn invalid_port_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "AMPERE_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_reads_file_and_tolerates_absence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.toml");
        assert_eq!(Config::load(&missing).expect("defaults"), Config::default());

        let path = dir.path().join("ampere.toml");
        std::fs::write(&path, "[schematic]\npath = \"bench.json\"\n").expect("write");
        let config = Config::load(&path).expect("load");
        assert_eq!(config.schematic.path, PathBuf::from("bench.json"));
    }
}
