//! Config file parsing for the TOML and YAML formats.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Serialization format of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.toml`
    Toml,
    /// `.yaml` or `.yml`
    Yaml,
}

impl Format {
    /// Pick the format from the file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Read and deserialize a config file.
///
/// # Errors
///
/// Returns an error if the extension is unsupported, the file cannot be
/// read, or its content does not match `T`.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_str(&content, format, path)
}

/// Deserialize `content` in `format`; `path` only labels errors.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] when the content is malformed.
pub fn parse_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<T, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    };
    match format {
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
        // An empty YAML document deserializes as unit; treat it like an empty map.
        Format::Yaml if content.trim().is_empty() => {
            serde_yaml::from_str("{}").map_err(|e| parse_error(e.to_string()))
        }
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}
