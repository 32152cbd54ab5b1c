//! registry::http
//!
//! Remote hosted registry backend.
//!
//! # Layout
//!
//! A hosted registry serves the index document at `<base>/registry.json`.
//! Each `LibraryRef.path` is the relative location of a *bundle* document
//! within the registry's versioned tree: a JSON object mapping relative file
//! paths to file contents.
//!
//! ```json
//! {
//!   "files": {
//!     "parts.yaml": "name: nginx\n",
//!     "nginx.libsonnet": "{}\n"
//!   }
//! }
//! ```
//!
//! Fetches are non-interactive; any authentication rides on the transport
//! the caller configured. Timeouts are caller-supplied and exceeded fetches
//! fail with [`RegistryError::Timeout`] without retrying.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::spec::{LibraryRef, Spec, INDEX_FILE};
use super::traits::{LibraryFile, Registry, RegistryError};

/// Default network timeout for registry fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A library bundle document served by a hosted registry.
#[derive(Debug, Deserialize)]
struct Bundle {
    /// Relative path -> file contents
    files: BTreeMap<String, String>,
}

/// Registry backed by a remote hosted tree.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    /// Configured registry name
    name: String,
    /// Base URL of the registry tree (no trailing slash)
    base_url: String,
    /// HTTP client, reused across requests
    client: Client,
    /// Caller-supplied timeout applied to every request
    timeout: Duration,
}

impl HttpRegistry {
    /// Create a hosted registry with the default timeout.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_timeout(name, base_url, DEFAULT_TIMEOUT)
    }

    /// Create a hosted registry with a caller-supplied timeout.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            name: name.into(),
            base_url,
            client: Client::new(),
            timeout,
        }
    }

    /// The registry's base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative.trim_start_matches('/'))
    }

    /// Map a transport error, distinguishing timeouts.
    fn transport_error(&self, err: reqwest::Error) -> RegistryError {
        if err.is_timeout() {
            RegistryError::Timeout {
                location: self.base_url.clone(),
            }
        } else {
            RegistryError::Unreachable {
                location: self.base_url.clone(),
                reason: err.to_string(),
            }
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Option<Vec<u8>>, RegistryError> {
        debug!(registry = %self.name, %url, "fetching");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RegistryError::Unreachable {
                location: self.base_url.clone(),
                reason: format!("{}: unexpected status {}", url, response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(Some(bytes.to_vec()))
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> &'static str {
        "http"
    }

    async fn fetch_index(&self) -> Result<Spec, RegistryError> {
        let url = self.url(INDEX_FILE);
        let bytes = self
            .get_bytes(&url)
            .await?
            .ok_or_else(|| RegistryError::IndexInvalid {
                location: self.base_url.clone(),
                reason: format!("no index at {}", url),
            })?;

        Spec::parse(&bytes).map_err(|e| RegistryError::IndexInvalid {
            location: self.base_url.clone(),
            reason: e.to_string(),
        })
    }

    async fn fetch_contents(
        &self,
        name: &str,
        library_ref: &LibraryRef,
    ) -> Result<Vec<LibraryFile>, RegistryError> {
        let url = self.url(&library_ref.path);
        let bytes = self
            .get_bytes(&url)
            .await?
            .ok_or_else(|| RegistryError::LibraryNotFound {
                name: name.to_string(),
                path: library_ref.path.clone(),
            })?;

        let bundle: Bundle =
            serde_json::from_slice(&bytes).map_err(|e| RegistryError::Unreachable {
                location: self.base_url.clone(),
                reason: format!("malformed bundle for '{}': {}", name, e),
            })?;

        // BTreeMap iteration keeps the sequence path-sorted.
        Ok(bundle
            .files
            .into_iter()
            .map(|(path, contents)| LibraryFile {
                path: PathBuf::from(path),
                contents: contents.into_bytes(),
            })
            .collect())
    }
}
