//! Bridge configuration.
//!
//! Loaded from a TOML file given on the command line. Every section and key
//! is optional; missing values take the defaults below.
//!
//! ```toml
//! [sequencer]
//! hold_ms = 300
//! rest_ms = 100
//!
//! [display]
//! target_fps = 30
//! alternate_screen = true
//!
//! [input]
//! poll_timeout_ms = 10
//! release_fallback = true
//! ```

use crate::sequencer::SequencerTiming;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// A value is out of range.
    #[error("invalid config value `{key}`: {reason}")]
    Invalid {
        /// Dotted key, e.g. `display.target_fps`.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Scripted input timing.
    #[serde(default)]
    pub sequencer: SequencerConfig,
    /// Frame pacing and terminal modes.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Raw input capture.
    #[serde(default)]
    pub input: InputConfig,
}

/// `[sequencer]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerConfig {
    /// How long each scripted key stays down.
    pub hold_ms: u64,
    /// Pause after each scripted release.
    pub rest_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            hold_ms: 300,
            rest_ms: 100,
        }
    }
}

impl SequencerConfig {
    /// Durations for the sequencer.
    pub const fn timing(&self) -> SequencerTiming {
        SequencerTiming {
            hold: Duration::from_millis(self.hold_ms),
            rest: Duration::from_millis(self.rest_ms),
        }
    }
}

/// `[display]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Module steps per second.
    pub target_fps: u32,
    /// Whether to use the alternate screen buffer.
    pub alternate_screen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            alternate_screen: true,
        }
    }
}

impl DisplayConfig {
    /// Time between frame ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

/// `[input]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// How long the capture thread waits for an event before checking for
    /// shutdown.
    pub poll_timeout_ms: u64,
    /// Pair every press with an immediate release when the terminal cannot
    /// report releases.
    pub release_fallback: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 10,
            release_fallback: true,
        }
    }
}

impl InputConfig {
    /// Poll timeout as a duration.
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

impl BridgeConfig {
    /// Load configuration from a file path.
    ///
    /// `None` yields the defaults. A given path must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a value is
    /// out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema or a
    /// value is out of range.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=240).contains(&self.display.target_fps) {
            return Err(ConfigError::Invalid {
                key: "display.target_fps",
                reason: format!("{} is not in 1..=240", self.display.target_fps),
            });
        }
        if self.sequencer.hold_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "sequencer.hold_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.input.poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "input.poll_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::load(None).unwrap();
        assert_eq!(config.sequencer.timing(), SequencerTiming::default());
        assert_eq!(config.display.target_fps, 30);
        assert!(config.display.alternate_screen);
        assert_eq!(config.input.poll_timeout(), Duration::from_millis(10));
        assert!(config.input.release_fallback);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = BridgeConfig::from_toml("[sequencer]\nhold_ms = 50\n").unwrap();
        assert_eq!(config.sequencer.hold_ms, 50);
        assert_eq!(config.sequencer.rest_ms, 100);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\ntarget_fps = 60\nalternate_screen = false").unwrap();

        let config = BridgeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.display.target_fps, 60);
        assert!(!config.display.alternate_screen);
        assert_eq!(config.display.frame_interval(), Duration::from_secs(1) / 60);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            BridgeConfig::load(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display\n").unwrap();

        let err = BridgeConfig::load(Some(file.path())).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            BridgeConfig::from_toml("[input]\npoll_ms = 5\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            BridgeConfig::from_toml("[display]\ntarget_fps = 0\n"),
            Err(ConfigError::Invalid { key: "display.target_fps", .. })
        ));
        assert!(matches!(
            BridgeConfig::from_toml("[display]\ntarget_fps = 1000\n"),
            Err(ConfigError::Invalid { key: "display.target_fps", .. })
        ));
        assert!(matches!(
            BridgeConfig::from_toml("[sequencer]\nhold_ms = 0\n"),
            Err(ConfigError::Invalid { key: "sequencer.hold_ms", .. })
        ));
        assert!(matches!(
            BridgeConfig::from_toml("[input]\npoll_timeout_ms = 0\n"),
            Err(ConfigError::Invalid { key: "input.poll_timeout_ms", .. })
        ));
        // Zero rest is allowed
        assert!(BridgeConfig::from_toml("[sequencer]\nrest_ms = 0\n").is_ok());
    }
}
