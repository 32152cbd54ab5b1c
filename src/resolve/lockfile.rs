//! resolve::lockfile
//!
//! The lockfile: persisted record of the exact resolved version per
//! dependency.
//!
//! # Format
//!
//! Indented JSON at a fixed path in the application root:
//!
//! ```json
//! {
//!   "apiVersion": "0.1",
//!   "libraries": {
//!     "nginx": {
//!       "version": "0.0.2",
//!       "path": "nginx/0.0.2",
//!       "registry": "incubator"
//!     }
//!   }
//! }
//! ```
//!
//! # Atomicity
//!
//! Writes go to a temporary file in the lockfile's directory, are flushed,
//! and are renamed over the previous lockfile in one step. A crash mid-write
//! leaves the old lockfile intact.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lockfile format version.
pub const LOCKFILE_API_VERSION: &str = "0.1";

/// Errors from lockfile I/O.
#[derive(Debug, Error)]
pub enum LockfileError {
    /// The lockfile exists but could not be parsed.
    #[error("failed to parse lockfile {path}: {reason}")]
    Parse {
        /// Lockfile path
        path: String,
        /// Why parsing failed
        reason: String,
    },

    /// Reading or writing the lockfile failed.
    #[error("lockfile i/o error at {path}: {reason}")]
    Io {
        /// Lockfile path
        path: String,
        /// The underlying failure
        reason: String,
    },
}

/// The durable record of one resolved dependency.
///
/// This is the only entity the resolver writes to stable storage. The
/// library name is the key of the containing map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledLibrary {
    /// Resolved concrete version
    pub version: String,
    /// Install location relative to the vendor root (`<name>/<version>`)
    pub path: String,
    /// Name of the registry that resolved this dependency
    pub registry: String,
}

/// The lockfile: resolved libraries keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Lockfile format version
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resolved libraries, keyed by dependency name
    pub libraries: BTreeMap<String, InstalledLibrary>,
}

impl Lockfile {
    /// Create an empty lockfile.
    pub fn new() -> Self {
        Self {
            api_version: LOCKFILE_API_VERSION.to_string(),
            libraries: BTreeMap::new(),
        }
    }

    /// Read a lockfile, returning `Ok(None)` if the path does not exist.
    ///
    /// # Errors
    ///
    /// - [`LockfileError::Parse`] if the file exists but is malformed
    /// - [`LockfileError::Io`] for other read failures
    pub fn read(path: &Path) -> Result<Option<Self>, LockfileError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LockfileError::Io {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let lockfile = serde_json::from_slice(&bytes).map_err(|e| LockfileError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(lockfile))
    }

    /// Write the lockfile atomically.
    ///
    /// The temporary file lives in the lockfile's directory so the final
    /// rename never crosses a filesystem boundary.
    pub fn write(&self, path: &Path) -> Result<(), LockfileError> {
        let io_err = |e: String| LockfileError::Io {
            path: path.display().to_string(),
            reason: e,
        };

        let dir = path.parent().ok_or_else(|| io_err("no parent directory".to_string()))?;
        let json = serde_json::to_string_pretty(self).map_err(|e| io_err(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file_mut().sync_all())
            .map_err(|e| io_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| io_err(e.to_string()))?;
        Ok(())
    }
}

impl Default for Lockfile {
    fn default() -> Self {
        Self::new()
    }
}
