//! registry::fs
//!
//! Local filesystem registry backend.
//!
//! # Layout
//!
//! A filesystem registry is a directory containing the index document at its
//! root; every `LibraryRef.path` is a directory relative to that root:
//!
//! ```text
//! /srv/registry/
//!   registry.json
//!   incubator/
//!     nginx/
//!       parts.yaml
//!       nginx.libsonnet
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::spec::{LibraryRef, Spec, INDEX_FILE};
use super::traits::{LibraryFile, Registry, RegistryError};

/// Registry backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsRegistry {
    /// Configured registry name
    name: String,
    /// Root directory holding the index and library trees
    root: PathBuf,
}

impl FsRegistry {
    /// Create a filesystem registry rooted at `root`.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// The registry's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }

    /// Collect every file under `dir`, returning paths relative to `base`.
    ///
    /// Entries are visited in sorted order so the resulting sequence is
    /// deterministic across platforms.
    fn walk(
        base: &Path,
        dir: &Path,
        out: &mut Vec<LibraryFile>,
        location: &str,
    ) -> Result<(), RegistryError> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| RegistryError::Unreachable {
                location: location.to_string(),
                reason: format!("{}: {}", dir.display(), e),
            })?
            .collect::<Result<_, _>>()
            .map_err(|e| RegistryError::Unreachable {
                location: location.to_string(),
                reason: format!("{}: {}", dir.display(), e),
            })?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                Self::walk(base, &path, out, location)?;
            } else {
                let contents = std::fs::read(&path).map_err(|e| RegistryError::Unreachable {
                    location: location.to_string(),
                    reason: format!("{}: {}", path.display(), e),
                })?;
                let relative = path
                    .strip_prefix(base)
                    .expect("walk stays under base")
                    .to_path_buf();
                out.push(LibraryFile {
                    path: relative,
                    contents,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Registry for FsRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> &'static str {
        "fs"
    }

    async fn fetch_index(&self) -> Result<Spec, RegistryError> {
        let index_path = self.root.join(INDEX_FILE);
        let bytes = std::fs::read(&index_path).map_err(|e| RegistryError::Unreachable {
            location: self.location(),
            reason: format!("{}: {}", index_path.display(), e),
        })?;
        Spec::parse(&bytes).map_err(|e| RegistryError::IndexInvalid {
            location: self.location(),
            reason: e.to_string(),
        })
    }

    async fn fetch_contents(
        &self,
        name: &str,
        library_ref: &LibraryRef,
    ) -> Result<Vec<LibraryFile>, RegistryError> {
        let dir = self.root.join(&library_ref.path);
        if !dir.is_dir() {
            return Err(RegistryError::LibraryNotFound {
                name: name.to_string(),
                path: library_ref.path.clone(),
            });
        }

        let mut files = Vec::new();
        Self::walk(&dir, &dir, &mut files, &self.location())?;
        Ok(files)
    }
}
