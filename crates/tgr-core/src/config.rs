//! Configuration system for the tgr3d compiler

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub compiler: CompilerConfig,
    pub debug: DebugConfig,
}

/// Code generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Number of uniform slots at the top of the uniform space that hold
    /// immediates. Immediate `i` lives in slot `1023 - i`.
    pub immediate_reserve: u32,
    /// First register of the fragment output pair read by the store epilogue.
    pub output_register_base: u8,
    /// Render target written by fragment output 0.
    pub colour_buffer_base: u8,
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
    /// Log every packed instruction word at debug level
    pub dump_shaders: bool,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            immediate_reserve: 64,
            output_register_base: 2,
            colour_buffer_base: 1,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            dump_shaders: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    /// when no file exists.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tgr3d")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.compiler.immediate_reserve, 64);
        assert_eq!(config.compiler.output_register_base, 2);
        assert_eq!(config.compiler.colour_buffer_base, 1);
        assert_eq!(config.debug.log_level, LogLevel::Warn);
        assert!(!config.debug.dump_shaders);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.compiler.immediate_reserve,
            config.compiler.immediate_reserve
        );
    }

    #[test]
    fn test_partial_config() {
        let parsed: Config = toml::from_str("[compiler]\noutput_register_base = 0\n").unwrap();
        assert_eq!(parsed.compiler.output_register_base, 0);
        assert_eq!(parsed.compiler.immediate_reserve, 64);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("tgr3d_config_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.debug.dump_shaders = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.debug.dump_shaders);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
