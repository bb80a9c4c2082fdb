//! Application configuration management for `ripple.toml`.
//!
//! # Sections
//!
//! | Section   | Purpose                                          |
//! |-----------|--------------------------------------------------|
//! | `[serve]` | HTTP/WebSocket listeners (interface, ports)      |

mod serve;

pub use serve::ServeConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing ripple.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server settings
    pub serve: ServeConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Load configuration from `ripple.toml` in the current directory,
    /// falling back to defaults when the file does not exist.
    pub fn load_or_default() -> Result<Self> {
        let path = Path::new("ripple.toml");
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
pub(crate) fn test_parse_config(raw: &str) -> AppConfig {
    AppConfig::parse(raw).expect("test config should parse")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.serve.port, ServeConfig::default().port);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[serve]\nport = 4000").expect("write config");

        let config = AppConfig::load(file.path()).expect("load config");
        assert_eq!(config.serve.port, 4000);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(AppConfig::load("/nonexistent/ripple.toml").is_err());
    }
}
