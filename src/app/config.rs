//! app::config
//!
//! The application configuration file, `konstruct.toml`.
//!
//! # Format
//!
//! ```toml
//! [[registries]]
//! name = "incubator"
//! protocol = "http"
//! location = "https://registry.konstruct.io/incubator"
//!
//! [[dependencies]]
//! name = "nginx"
//! version = "0.0.2"
//! registry = "incubator"
//! ```
//!
//! Registry declaration order is resolution priority order. `version` and
//! `registry` on a dependency are optional pins.
//!
//! # Validation
//!
//! Config values are validated after parsing: names must be non-empty and
//! unique, protocols must be known, and dependency registry pins must name
//! a configured registry.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::RegistryProtocol;
use crate::resolve::Dependency;

/// Errors from configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidValue(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// Config file path
        path: String,
        /// Why parsing failed
        reason: String,
    },

    /// Reading or writing the configuration failed.
    #[error("config i/o error at {path}: {reason}")]
    Io {
        /// Config file path
        path: String,
        /// The underlying failure
        reason: String,
    },
}

/// One configured registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Registry name, referenced by dependency pins
    pub name: String,
    /// Backend protocol ("fs" or "http")
    pub protocol: String,
    /// Root directory (fs) or base URL (http)
    pub location: String,
}

impl RegistryConfig {
    /// The parsed protocol.
    pub fn parsed_protocol(&self) -> Option<RegistryProtocol> {
        RegistryProtocol::parse(&self.protocol)
    }
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyConfig {
    /// Library name
    pub name: String,
    /// Exact version pin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Registry pin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
}

impl From<&DependencyConfig> for Dependency {
    fn from(config: &DependencyConfig) -> Self {
        Dependency {
            name: config.name.clone(),
            version: config.version.clone(),
            registry: config.registry.clone(),
        }
    }
}

/// The application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Configured registries, in resolution priority order
    pub registries: Vec<RegistryConfig>,

    /// Declared dependencies
    pub dependencies: Vec<DependencyConfig>,
}

impl AppConfig {
    /// Read and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Io`] if the file cannot be read
    /// - [`ConfigError::Parse`] for malformed TOML
    /// - [`ConfigError::InvalidValue`] from validation
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: AppConfig = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration atomically.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: String| ConfigError::Io {
            path: path.display().to_string(),
            reason: e,
        };

        let text = toml::to_string_pretty(self).map_err(|e| io_err(e.to_string()))?;
        let dir = path
            .parent()
            .ok_or_else(|| io_err("no parent directory".to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_err(e.to_string()))?;
        tmp.write_all(text.as_bytes())
            .map_err(|e| io_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| io_err(e.to_string()))?;
        Ok(())
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for registry in &self.registries {
            if registry.name.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "registry name cannot be empty".to_string(),
                ));
            }
            if !names.insert(registry.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate registry '{}'",
                    registry.name
                )));
            }
            if registry.parsed_protocol().is_none() {
                let valid: Vec<_> = RegistryProtocol::all().iter().map(|p| p.name()).collect();
                return Err(ConfigError::InvalidValue(format!(
                    "invalid protocol '{}' for registry '{}', must be one of: {}",
                    registry.protocol,
                    registry.name,
                    valid.join(", ")
                )));
            }
            if registry.location.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "registry '{}' has an empty location",
                    registry.name
                )));
            }
        }

        for dep in &self.dependencies {
            if dep.name.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "dependency name cannot be empty".to_string(),
                ));
            }
            if let Some(pinned) = &dep.registry {
                if !names.contains(pinned.as_str()) {
                    return Err(ConfigError::InvalidValue(format!(
                        "dependency '{}' references unknown registry '{}'",
                        dep.name, pinned
                    )));
                }
            }
        }
        Ok(())
    }

    /// The declared dependencies as resolver inputs.
    pub fn declared_dependencies(&self) -> Vec<Dependency> {
        self.dependencies.iter().map(Dependency::from).collect()
    }

    /// Add or update a dependency declaration.
    ///
    /// An existing declaration with the same name is replaced.
    pub fn upsert_dependency(&mut self, dep: DependencyConfig) {
        match self.dependencies.iter_mut().find(|d| d.name == dep.name) {
            Some(existing) => *existing = dep,
            None => self.dependencies.push(dep),
        }
    }

    /// Remove a dependency declaration, returning whether it existed.
    pub fn remove_dependency(&mut self, name: &str) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d.name != name);
        self.dependencies.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            registries: vec![RegistryConfig {
                name: "incubator".to_string(),
                protocol: "http".to_string(),
                location: "https://registry.konstruct.io/incubator".to_string(),
            }],
            dependencies: vec![DependencyConfig {
                name: "nginx".to_string(),
                version: Some("0.0.2".to_string()),
                registry: Some("incubator".to_string()),
            }],
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn roundtrip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("konstruct.toml");

        let config = sample();
        config.write(&path).unwrap();
        let read = AppConfig::read(&path).unwrap();
        assert_eq!(config, read);
    }

    #[test]
    fn empty_registry_name_rejected() {
        let mut config = sample();
        config.registries[0].name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_registry_rejected() {
        let mut config = sample();
        config.registries.push(config.registries[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_protocol_rejected() {
        let mut config = sample();
        config.registries[0].protocol = "gopher".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gopher"));
    }

    #[test]
    fn dangling_dependency_pin_rejected() {
        let mut config = sample();
        config.dependencies[0].registry = Some("nowhere".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn reject_unknown_fields() {
        let toml = r#"
            [[registries]]
            name = "incubator"
            protocol = "http"
            location = "https://example"
            surprise = true
        "#;
        assert!(toml::from_str::<AppConfig>(toml).is_err());
    }

    #[test]
    fn optional_pins_omitted_from_serialization() {
        let config = AppConfig {
            registries: vec![],
            dependencies: vec![DependencyConfig {
                name: "nginx".to_string(),
                version: None,
                registry: None,
            }],
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("version"));
        assert!(!text.contains("registry ="));
    }

    #[test]
    fn upsert_replaces_existing() {
        let mut config = sample();
        config.upsert_dependency(DependencyConfig {
            name: "nginx".to_string(),
            version: Some("0.0.3".to_string()),
            registry: None,
        });
        assert_eq!(config.dependencies.len(), 1);
        assert_eq!(config.dependencies[0].version.as_deref(), Some("0.0.3"));

        config.upsert_dependency(DependencyConfig {
            name: "redis".to_string(),
            version: None,
            registry: None,
        });
        assert_eq!(config.dependencies.len(), 2);
    }

    #[test]
    fn remove_reports_existence() {
        let mut config = sample();
        assert!(config.remove_dependency("nginx"));
        assert!(!config.remove_dependency("nginx"));
        assert!(config.dependencies.is_empty());
    }

    #[test]
    fn declared_dependencies_map_pins() {
        let deps = sample().declared_dependencies();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "nginx");
        assert_eq!(deps[0].version.as_deref(), Some("0.0.2"));
        assert_eq!(deps[0].registry.as_deref(), Some("incubator"));
    }
}
