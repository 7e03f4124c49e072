//! Format-agnostic configuration file loading

use std::fs;

use serde::de::DeserializeOwned;

use crate::{Error, NormalizedPath, Result};

/// Load and deserialize a configuration file.
///
/// Format is detected from file extension:
/// - `.toml` -> TOML
/// - `.json` -> JSON
/// - `.yaml`, `.yml` -> YAML
pub fn load_config<T: DeserializeOwned>(path: &NormalizedPath) -> Result<T> {
    let extension = path.extension().unwrap_or("").to_lowercase();
    let format = match extension.as_str() {
        "toml" => "TOML",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        _ => return Err(Error::UnsupportedFormat { extension }),
    };

    let content = fs::read_to_string(path.to_native()).map_err(|e| Error::io(path.to_native(), e))?;
    tracing::debug!(path = %path, format, "Loading config file");

    let parsed = match format {
        "TOML" => toml::from_str(&content).map_err(|e| e.to_string()),
        "JSON" => serde_json::from_str(&content).map_err(|e| e.to_string()),
        _ => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| Error::ConfigParse {
        path: path.to_native(),
        format: format.into(),
        message,
    })
}
