//! TOML settings file.
//!
//! ```toml
//! import_root = "/home/me/.config/REAPER/Effects"
//! data_root = "/home/me/.config/REAPER/Data"
//! midi_capacity = 4096
//! midi_extensible = false
//! block_size = 256
//! sample_rate = 48000.0
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{Config, DEFAULT_BLOCK_SIZE, DEFAULT_MIDI_CAPACITY, DEFAULT_SAMPLE_RATE};
use crate::error::ConfigError;

/// Persisted host settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Import root override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_root: Option<PathBuf>,
    /// Data root override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    /// MIDI buffer capacity in bytes.
    pub midi_capacity: usize,
    /// Whether MIDI buffers grow when full.
    pub midi_extensible: bool,
    /// Initial block size.
    pub block_size: u32,
    /// Initial sample rate.
    pub sample_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            import_root: None,
            data_root: None,
            midi_capacity: DEFAULT_MIDI_CAPACITY,
            midi_extensible: true,
            block_size: DEFAULT_BLOCK_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Check that configured roots exist as directories.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (kind, root) in [("import", &self.import_root), ("data", &self.data_root)] {
            if let Some(path) = root
                && !path.is_dir()
            {
                return Err(ConfigError::invalid_root(kind, path));
            }
        }
        Ok(())
    }

    /// Apply these settings on top of `config`.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(root) = &self.import_root {
            config = config.with_import_root(root);
        }
        if let Some(root) = &self.data_root {
            config = config.with_data_root(root);
        }
        config
            .with_midi_capacity(self.midi_capacity, self.midi_extensible)
            .with_audio_defaults(self.block_size, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn partial_file() {
        let s = Settings::from_toml("block_size = 512\nmidi_extensible = false\n").unwrap();
        assert_eq!(s.block_size, 512);
        assert!(!s.midi_extensible);
        assert_eq!(s.midi_capacity, DEFAULT_MIDI_CAPACITY);
        assert!(s.import_root.is_none());
    }

    #[test]
    fn toml_roundtrip() {
        let s = Settings {
            import_root: Some(PathBuf::from("/fx")),
            sample_rate: 96000.0,
            ..Settings::default()
        };
        let text = s.to_toml().unwrap();
        assert!(text.contains("import_root"));
        assert!(!text.contains("data_root"));
        assert_eq!(Settings::from_toml(&text).unwrap(), s);
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = Settings::from_toml("block_size = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn missing_roots_fail_validation() {
        let s = Settings {
            data_root: Some(PathBuf::from("/definitely/not/here")),
            ..Settings::default()
        };
        let err = s.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot { kind: "data", .. }));
        assert!(Settings::default().validate().is_ok());
    }
}
