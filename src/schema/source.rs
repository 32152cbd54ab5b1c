//! schema::source
//!
//! Resolving a schema from one of three origins.
//!
//! # Origins
//!
//! - `version:<tag>` - the swagger artifact published for a Kubernetes
//!   release tag, fetched from the canonical raw-content location
//! - `file:<path>` - local bytes
//! - live cluster - the `/openapi/v2` discovery document of an
//!   already-known server URI (supplied by the caller; this module never
//!   inspects kubeconfig itself)
//!
//! All three converge on [`parse_swagger`], so validation behavior is
//! identical regardless of origin.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use super::model::Schema;
use super::parse::parse_swagger;
use super::SchemaError;

/// URL template for release-tag swagger artifacts.
const RELEASE_ARTIFACT_URL: &str =
    "https://raw.githubusercontent.com/kubernetes/kubernetes/{tag}/api/openapi-spec/swagger.json";

/// Discovery document path on an API server.
const DISCOVERY_PATH: &str = "/openapi/v2";

/// Default network timeout for schema fetches.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSpecifier {
    /// A pinned release tag (`version:v1.7.0`)
    Version(String),
    /// A local swagger file (`file:swagger.json`)
    File(PathBuf),
    /// The discovery document of a reachable cluster
    Cluster {
        /// API server URI, e.g. `https://10.0.0.1:6443`
        server: String,
    },
}

impl SchemaSpecifier {
    /// Parse a `version:<tag>` or `file:<path>` specifier string.
    ///
    /// The cluster variant has no string form: it is constructed by the
    /// caller from an ambient cluster context.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Parse`] for an unrecognized prefix or empty payload.
    ///
    /// # Example
    ///
    /// ```
    /// use konstruct::schema::SchemaSpecifier;
    /// use std::path::PathBuf;
    ///
    /// assert_eq!(
    ///     SchemaSpecifier::parse("version:v1.7.0").unwrap(),
    ///     SchemaSpecifier::Version("v1.7.0".to_string())
    /// );
    /// assert_eq!(
    ///     SchemaSpecifier::parse("file:swagger.json").unwrap(),
    ///     SchemaSpecifier::File(PathBuf::from("swagger.json"))
    /// );
    /// assert!(SchemaSpecifier::parse("cluster:foo").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        if let Some(tag) = s.strip_prefix("version:") {
            if tag.is_empty() {
                return Err(SchemaError::Parse {
                    reason: "empty release tag in schema specifier".to_string(),
                });
            }
            return Ok(SchemaSpecifier::Version(tag.to_string()));
        }
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return Err(SchemaError::Parse {
                    reason: "empty path in schema specifier".to_string(),
                });
            }
            return Ok(SchemaSpecifier::File(PathBuf::from(path)));
        }
        Err(SchemaError::Parse {
            reason: format!(
                "unrecognized schema specifier '{}' (expected 'version:<tag>' or 'file:<path>')",
                s
            ),
        })
    }

    /// A short human-readable description of the origin, for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            SchemaSpecifier::Version(tag) => format!("version:{}", tag),
            SchemaSpecifier::File(path) => format!("file:{}", path.display()),
            SchemaSpecifier::Cluster { server } => format!("cluster {}", server),
        }
    }
}

/// Resolves [`SchemaSpecifier`]s into validated [`Schema`]s.
pub struct SchemaSource {
    client: Client,
    timeout: Duration,
}

impl SchemaSource {
    /// Create a source with the default network timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a source with a caller-supplied network timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    /// Resolve a specifier into a schema.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::NotFound`] for an unrecognized release tag
    /// - [`SchemaError::Unreachable`] for network or file I/O failures
    /// - [`SchemaError::Parse`] / [`SchemaError::Invalid`] from parsing
    pub async fn resolve(&self, specifier: &SchemaSpecifier) -> Result<Schema, SchemaError> {
        debug!(origin = %specifier.describe(), "resolving schema");
        match specifier {
            SchemaSpecifier::Version(tag) => {
                let bytes = self.fetch_release(tag).await?;
                parse_swagger(&bytes, tag)
            }
            SchemaSpecifier::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| SchemaError::Unreachable {
                    uri: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                parse_swagger(&bytes, &path.display().to_string())
            }
            SchemaSpecifier::Cluster { server } => {
                let bytes = self.fetch_cluster(server).await?;
                parse_swagger(&bytes, server)
            }
        }
    }

    /// Fetch the published swagger artifact for a release tag.
    async fn fetch_release(&self, tag: &str) -> Result<Vec<u8>, SchemaError> {
        let url = RELEASE_ARTIFACT_URL.replace("{tag}", tag);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SchemaError::Unreachable {
                uri: url.clone(),
                reason: e.to_string(),
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SchemaError::NotFound {
                tag: tag.to_string(),
            }),
            status if status.is_success() => {
                let bytes = response.bytes().await.map_err(|e| SchemaError::Unreachable {
                    uri: url,
                    reason: e.to_string(),
                })?;
                Ok(bytes.to_vec())
            }
            status => Err(SchemaError::Unreachable {
                uri: url,
                reason: format!("unexpected status {}", status),
            }),
        }
    }

    /// Fetch the discovery document from a cluster's API server.
    async fn fetch_cluster(&self, server: &str) -> Result<Vec<u8>, SchemaError> {
        let url = format!("{}{}", server.trim_end_matches('/'), DISCOVERY_PATH);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SchemaError::Unreachable {
                uri: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SchemaError::Unreachable {
                uri: url,
                reason: format!("unexpected status {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| SchemaError::Unreachable {
            uri: url,
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

impl Default for SchemaSource {
    fn default() -> Self {
        Self::new()
    }
}
