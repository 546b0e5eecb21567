use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub groupings: GroupingsConfig,
}
impl Config {
    pub const FILENAME: &str = "config.toml";

    /// Loads [`Self::FILENAME`] from the working directory.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(Self::FILENAME)
    }

    /// Loads the config at `path`, falling back to the defaults if it does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, creating default config");
                Ok(Config::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(Self::FILENAME)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        std::fs::write(path, toml::to_string(self)?)?;
        tracing::info!("saved config to {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct General {
    /// Where the library snapshot is read from.
    pub library_path: PathBuf,
}
impl Default for General {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from("library.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GroupingsConfig {
    /// How long to wait for a grouping before reporting it unavailable. Zero waits forever.
    pub response_timeout_secs: f32,
}
impl Default for GroupingsConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: 30.0,
        }
    }
}
impl GroupingsConfig {
    /// The timeout as a [`Duration`]; `None` means wait forever.
    ///
    /// Values too large to represent also wait forever.
    pub fn response_timeout(&self) -> Option<Duration> {
        if self.response_timeout_secs.is_nan() || self.response_timeout_secs <= 0.0 {
            return None;
        }
        match Duration::try_from_secs_f32(self.response_timeout_secs) {
            Ok(timeout) => Some(timeout),
            Err(e) => {
                tracing::warn!(
                    "response_timeout_secs = {} is out of range ({e}); waiting forever",
                    self.response_timeout_secs
                );
                None
            }
        }
    }
}

#[derive(Debug)]
/// An error that can occur when loading or saving the config.
pub enum ConfigError {
    /// The config file could not be read or written.
    Io(std::io::Error),
    /// The config file is not valid TOML, or has the wrong shape.
    Parse(toml::de::Error),
    /// The config could not be serialized.
    Serialize(toml::ser::Error),
}
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "Failed to parse {}: {e}", Config::FILENAME),
            ConfigError::Serialize(e) => write!(f, "Failed to serialize config: {e}"),
        }
    }
}
impl std::error::Error for ConfigError {}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}
impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}
/// A result type for config loading and saving.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[groupings]\nresponse_timeout_secs = 2.5\n").unwrap();
        assert_eq!(config.general, General::default());
        assert_eq!(
            config.groupings.response_timeout(),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = GroupingsConfig {
            response_timeout_secs: 0.0,
        };
        assert_eq!(config.response_timeout(), None);
    }

    #[test]
    fn test_out_of_range_timeout_waits_forever() {
        for secs in [1e30, f32::INFINITY, f32::NAN, -1.0] {
            let config = GroupingsConfig {
                response_timeout_secs: secs,
            };
            assert_eq!(config.response_timeout(), None, "{secs}");
        }
        let config = GroupingsConfig {
            response_timeout_secs: 1e19,
        };
        assert!(config.response_timeout().is_some());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("vibin-config-{}.toml", std::process::id()));
        let config = Config {
            general: General {
                library_path: PathBuf::from("/music/library.json"),
            },
            groupings: GroupingsConfig {
                response_timeout_secs: 5.0,
            },
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load_from("/nonexistent/vibin/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let path = std::env::temp_dir().join(format!("vibin-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[groupings]\nresponse_timeout_secs = \"soon\"\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_file(&path).unwrap();
    }
}
