//! Configuration file loader supporting multiple formats
//!
//! Loads YAML, TOML and JSON, detecting the format from the file extension.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect the format from a path
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(format!("{} has no extension", path.display())))?;
        Self::from_extension(extension)
            .ok_or_else(|| Error::UnsupportedFormat(extension.to_string()))
    }
}

/// Loader for configuration and world files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a value from a file, choosing the format by extension
    pub fn load_from_file<T, P>(path: P) -> Result<T>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        debug!(path = %path.display(), ?format, "Loading configuration");
        let content = std::fs::read_to_string(path)?;
        Self::load_from_string(&content, format)
    }

    /// Parse a value from a string in the given format
    pub fn load_from_string<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T> {
        match format {
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            ConfigFormat::Toml => Ok(toml::from_str(content)?),
            ConfigFormat::Json => Ok(serde_json::from_str(content)?),
        }
    }

    /// Serialize a value to a string in the given format
    pub fn serialize<T: Serialize>(value: &T, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            ConfigFormat::Toml => toml::to_string_pretty(value)
                .map_err(|e| Error::ConfigError(format!("Failed to serialize to TOML: {}", e))),
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    /// Save a value to a file, choosing the format by extension
    pub fn save_to_file<T, P>(value: &T, path: P) -> Result<()>
    where
        T: Serialize,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = Self::serialize(value, ConfigFormat::from_path(path)?)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("YAML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
        assert!(ConfigFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_load_yaml() {
        let yaml = "parse_cache_capacity: 8\ngroups:\n  Builders: [can_dig, can_set_desc]\n";
        let config: EngineConfig = ConfigLoader::load_from_string(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.parse_cache_capacity, 8);
        assert_eq!(config.groups["Builders"].len(), 2);
    }

    #[test]
    fn test_load_toml() {
        let toml = "audit = true\npermission_hierarchy = [\"Players\", \"Wizards\"]\n";
        let config: EngineConfig = ConfigLoader::load_from_string(toml, ConfigFormat::Toml).unwrap();
        assert!(config.audit);
        assert_eq!(config.permission_hierarchy.len(), 2);
    }

    #[test]
    fn test_load_invalid_json() {
        let result: Result<EngineConfig> = ConfigLoader::load_from_string("{", ConfigFormat::Json);
        assert!(matches!(result, Err(Error::SerializationError(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("warden.toml");
        let config = EngineConfig::new()
            .with_audit(true)
            .with_group("Builders", &["can_dig"]);

        ConfigLoader::save_to_file(&config, &path).unwrap();
        let loaded: EngineConfig = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let result: Result<EngineConfig> = ConfigLoader::load_from_file("/nonexistent/warden.yaml");
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
