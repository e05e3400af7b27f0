use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

/// Error raised when a layer configuration cannot be read back.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The content is not a JSON document of the expected configuration.
    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    /// The configuration file could not be read.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),
}

/// A layer configuration kept as a JSON document.
///
/// Configurations describe how a layer is built, not its learned state; an archive is still
/// needed for the parameters.
pub trait Config: core::fmt::Debug + Serialize + DeserializeOwned {
    /// Write the configuration as pretty JSON.
    fn save<P: AsRef<Path>>(&self, file: P) -> std::io::Result<()> {
        std::fs::write(file, config_to_json(self)?)
    }

    /// Read a configuration written by [save](Config::save).
    fn load<P: AsRef<Path>>(file: P) -> Result<Self, ConfigError> {
        let file = file.as_ref();
        let content = std::fs::read_to_string(file)
            .map_err(|err| ConfigError::FileNotFound(format!("{}: {err}", file.display())))?;

        config_from_str(&content)
    }

    /// Read a configuration from the raw bytes of a JSON document.
    fn load_binary(data: &[u8]) -> Result<Self, ConfigError> {
        let content = core::str::from_utf8(data)
            .map_err(|err| ConfigError::InvalidFormat(format!("not utf-8: {err}")))?;

        config_from_str(content)
    }
}

/// The pretty JSON form of a configuration.
pub fn config_to_json<C: Config>(config: &C) -> std::io::Result<String> {
    serde_json::to_string_pretty(config).map_err(std::io::Error::other)
}

fn config_from_str<C: Config>(content: &str) -> Result<C, ConfigError> {
    serde_json::from_str(content).map_err(|err| ConfigError::InvalidFormat(err.to_string()))
}
