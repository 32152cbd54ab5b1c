//! registry::traits
//!
//! Registry trait definition for fetching indexes and library contents.
//!
//! # Design
//!
//! The `Registry` trait is async because the hosted backend involves network
//! I/O. The resolver and generator only ever see this trait; backend-specific
//! types never leak past it. All methods return `Result` so failures carry
//! the registry location and library identity for one-line diagnostics.
//!
//! # Example
//!
//! ```ignore
//! use konstruct::registry::{Registry, RegistryError};
//!
//! async fn latest_version(
//!     registry: &dyn Registry,
//!     name: &str,
//! ) -> Result<Option<String>, RegistryError> {
//!     let index = registry.fetch_index().await?;
//!     Ok(index.get(name).map(|r| r.version.clone()))
//! }
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use super::spec::{LibraryRef, Spec};

/// Errors from registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The registry location could not be reached.
    #[error("registry unreachable: {location}: {reason}")]
    Unreachable {
        /// Registry location (root path or base URL)
        location: String,
        /// The underlying failure
        reason: String,
    },

    /// The registry's index document is missing or malformed.
    #[error("invalid registry index at {location}: {reason}")]
    IndexInvalid {
        /// Registry location
        location: String,
        /// Why the index was rejected
        reason: String,
    },

    /// A resolved library ref's path is absent in the backend.
    #[error("library '{name}' not found at {path}")]
    LibraryNotFound {
        /// Library name
        name: String,
        /// The retrieval path that was absent
        path: String,
    },

    /// A network operation exceeded the caller-supplied timeout.
    ///
    /// Not retried here; retry policy belongs to the caller.
    #[error("registry timed out: {location}")]
    Timeout {
        /// Registry location
        location: String,
    },
}

/// One file of a fetched library tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFile {
    /// Path relative to the library root
    pub path: PathBuf,
    /// Raw file contents
    pub contents: Vec<u8>,
}

/// The Registry trait: one published index plus retrievable library trees.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; index prefetches for independent
/// registries run concurrently.
#[async_trait]
pub trait Registry: Send + Sync {
    /// The configured name of this registry (e.g. "incubator").
    fn name(&self) -> &str;

    /// The backend protocol (e.g. "fs", "http").
    fn protocol(&self) -> &'static str;

    /// Retrieve and parse the registry's published index.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Unreachable`] if the location cannot be read
    /// - [`RegistryError::IndexInvalid`] if the index is malformed
    /// - [`RegistryError::Timeout`] if the fetch exceeded its deadline
    async fn fetch_index(&self) -> Result<Spec, RegistryError>;

    /// Retrieve the library source tree for a resolved ref.
    ///
    /// Returns files in a deterministic (path-sorted) order.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::LibraryNotFound`] if the ref's path is absent
    /// - [`RegistryError::Unreachable`] / [`RegistryError::Timeout`] for
    ///   transport failures
    async fn fetch_contents(
        &self,
        name: &str,
        library_ref: &LibraryRef,
    ) -> Result<Vec<LibraryFile>, RegistryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_display() {
        assert_eq!(
            RegistryError::Unreachable {
                location: "https://example/reg".into(),
                reason: "connection refused".into(),
            }
            .to_string(),
            "registry unreachable: https://example/reg: connection refused"
        );
        assert_eq!(
            RegistryError::IndexInvalid {
                location: "/srv/registry".into(),
                reason: "unexpected kind".into(),
            }
            .to_string(),
            "invalid registry index at /srv/registry: unexpected kind"
        );
        assert_eq!(
            RegistryError::LibraryNotFound {
                name: "nginx".into(),
                path: "incubator/nginx".into(),
            }
            .to_string(),
            "library 'nginx' not found at incubator/nginx"
        );
        assert_eq!(
            RegistryError::Timeout {
                location: "https://example/reg".into(),
            }
            .to_string(),
            "registry timed out: https://example/reg"
        );
    }
}
