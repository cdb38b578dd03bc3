//! Application configuration — persisted as JSON.

use std::path::PathBuf;

use gguf_parser::DecodeOptions;
use serde::{Deserialize, Serialize};

/// Global configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default decode limits, overridable per invocation.
    #[serde(default)]
    pub decode: DecodeOptions,
    /// Bytes read from the front of a file; metadata precedes tensor data.
    #[serde(default = "default_scan_limit")]
    pub scan_limit_bytes: u64,
}

fn default_scan_limit() -> u64 {
    64 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            decode: DecodeOptions::default(),
            scan_limit_bytes: default_scan_limit(),
        }
    }
}

impl AppConfig {
    /// Platform config directory: `~/.config/gguf-inspect/`
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gguf-inspect")
    }

    fn config_file() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Load from disk, or return defaults if the file doesn't exist.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::config_file();
        if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir();
        std::fs::create_dir_all(&dir)?;
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::config_file(), data)?;
        Ok(())
    }

    /// Update one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "max_elements_per_array" => self.decode.max_elements_per_array = value.parse()?,
            "max_key_string_len" => self.decode.max_key_string_len = value.parse()?,
            "max_nesting_depth" => self.decode.max_nesting_depth = value.parse()?,
            "max_entries" => {
                self.decode.max_entries = match value {
                    "none" | "" => None,
                    n => Some(n.parse()?),
                }
            }
            "strict" => self.decode.strict = value.parse()?,
            "scan_limit_bytes" => self.scan_limit_bytes = value.parse()?,
            _ => anyhow::bail!("Unknown config key: {key}"),
        }
        Ok(())
    }
}
