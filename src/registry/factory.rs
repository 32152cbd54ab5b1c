//! registry::factory
//!
//! Registry protocol selection and backend construction.
//!
//! # Design
//!
//! This module is the one place that maps configured registry entries onto
//! concrete backends. The resolver and commands use [`create_registry`]
//! instead of importing backend types, keeping the architecture boundary
//! intact.

use std::path::PathBuf;
use std::time::Duration;

use super::fs::FsRegistry;
use super::http::HttpRegistry;
use super::traits::Registry;

/// Supported registry protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryProtocol {
    /// Local filesystem directory
    Fs,
    /// Remote hosted tree over HTTP(S)
    Http,
}

impl RegistryProtocol {
    /// All supported protocols.
    pub fn all() -> &'static [RegistryProtocol] {
        &[RegistryProtocol::Fs, RegistryProtocol::Http]
    }

    /// The protocol name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            RegistryProtocol::Fs => "fs",
            RegistryProtocol::Http => "http",
        }
    }

    /// Parse a protocol from its configuration name.
    ///
    /// # Example
    ///
    /// ```
    /// use konstruct::registry::RegistryProtocol;
    ///
    /// assert_eq!(RegistryProtocol::parse("http"), Some(RegistryProtocol::Http));
    /// assert_eq!(RegistryProtocol::parse("ftp"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fs" => Some(RegistryProtocol::Fs),
            "http" => Some(RegistryProtocol::Http),
            _ => None,
        }
    }
}

impl std::fmt::Display for RegistryProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Create a registry backend for a configured entry.
///
/// # Arguments
///
/// * `name` - The configured registry name
/// * `protocol` - Which backend to construct
/// * `location` - Root directory (fs) or base URL (http)
/// * `timeout` - Network timeout for hosted registries
pub fn create_registry(
    name: &str,
    protocol: RegistryProtocol,
    location: &str,
    timeout: Duration,
) -> Box<dyn Registry> {
    match protocol {
        RegistryProtocol::Fs => Box::new(FsRegistry::new(name, PathBuf::from(location))),
        RegistryProtocol::Http => Box::new(HttpRegistry::with_timeout(name, location, timeout)),
    }
}
