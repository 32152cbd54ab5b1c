//! registry::spec
//!
//! The registry index wire format.
//!
//! # Format
//!
//! An index is an indented-JSON document published at the registry root:
//!
//! ```json
//! {
//!   "apiVersion": "0.1",
//!   "kind": "ksonnet.io/registry",
//!   "gitVersion": null,
//!   "libraries": {
//!     "nginx": {
//!       "version": "0.0.2",
//!       "path": "incubator/nginx"
//!     }
//!   }
//! }
//! ```
//!
//! `apiVersion` and `kind` are validated against fixed constants on parse.
//! `gitVersion` (a registry-side pin of the index's own source tree) is
//! carried opaquely and round-tripped verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Expected `apiVersion` of a registry index.
pub const DEFAULT_API_VERSION: &str = "0.1";

/// Expected `kind` of a registry index.
pub const DEFAULT_KIND: &str = "ksonnet.io/registry";

/// File name of the index document at a registry root.
pub const INDEX_FILE: &str = "registry.json";

/// Errors from index parsing and validation.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The index bytes are not valid JSON for this shape.
    #[error("malformed index: {0}")]
    Json(#[from] serde_json::Error),

    /// The index declares an unsupported apiVersion.
    #[error("unsupported index apiVersion '{found}' (expected '{DEFAULT_API_VERSION}')")]
    WrongApiVersion {
        /// The apiVersion found in the document
        found: String,
    },

    /// The index declares an unexpected kind.
    #[error("unexpected index kind '{found}' (expected '{DEFAULT_KIND}')")]
    WrongKind {
        /// The kind found in the document
        found: String,
    },
}

/// A resolved library reference published by a registry.
///
/// `version` is the registry's canonical version tag; `path` is the
/// backend-specific retrieval location. Never mutated after resolution,
/// only replaced by re-resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRef {
    /// Canonical version tag
    pub version: String,
    /// Backend-specific retrieval location
    pub path: String,
}

/// One registry's published index: an immutable snapshot fetched at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    /// Index format version; validated against [`DEFAULT_API_VERSION`]
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Index document kind; validated against [`DEFAULT_KIND`]
    pub kind: String,

    /// Optional pin of the registry's own source tree; carried opaquely
    #[serde(rename = "gitVersion")]
    pub git_version: Option<Value>,

    /// Published libraries, keyed by name
    pub libraries: BTreeMap<String, LibraryRef>,
}

impl Spec {
    /// Create an empty index with the expected constants.
    pub fn new() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            kind: DEFAULT_KIND.to_string(),
            git_version: None,
            libraries: BTreeMap::new(),
        }
    }

    /// Serialize to the canonical wire form: 2-space indented JSON.
    pub fn marshal(&self) -> Result<String, SpecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate index bytes.
    ///
    /// # Errors
    ///
    /// - [`SpecError::Json`] for malformed JSON
    /// - [`SpecError::WrongApiVersion`] / [`SpecError::WrongKind`] for
    ///   documents that parse but declare unexpected constants
    pub fn parse(bytes: &[u8]) -> Result<Self, SpecError> {
        let spec: Spec = serde_json::from_slice(bytes)?;
        if spec.api_version != DEFAULT_API_VERSION {
            return Err(SpecError::WrongApiVersion {
                found: spec.api_version,
            });
        }
        if spec.kind != DEFAULT_KIND {
            return Err(SpecError::WrongKind { found: spec.kind });
        }
        Ok(spec)
    }

    /// Look up a published library by name.
    pub fn get(&self, name: &str) -> Option<&LibraryRef> {
        self.libraries.get(name)
    }
}

impl Default for Spec {
    fn default() -> Self {
        Self::new()
    }
}
