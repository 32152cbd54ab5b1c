//! registry::mock
//!
//! Mock registry implementation for deterministic testing.
//!
//! # Design
//!
//! The mock registry serves an in-memory index and in-memory library trees,
//! records every fetch so tests can assert on access patterns (index fetched
//! at most once per resolution run, no content fetch on idempotent
//! re-install), and allows configuring failure scenarios.
//!
//! # Example
//!
//! ```
//! use konstruct::registry::mock::MockRegistry;
//! use konstruct::registry::{LibraryRef, Registry};
//!
//! # tokio_test::block_on(async {
//! let registry = MockRegistry::new("incubator")
//!     .with_library("nginx", "0.0.2", &[("nginx.libsonnet", "{}\n")]);
//!
//! let index = registry.fetch_index().await.unwrap();
//! assert_eq!(index.get("nginx").unwrap().version, "0.0.2");
//! assert_eq!(registry.index_fetches(), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::spec::{LibraryRef, Spec};
use super::traits::{LibraryFile, Registry, RegistryError};

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail fetch_index with the given error.
    FetchIndex(RegistryError),
    /// Fail fetch_contents with the given error.
    FetchContents(RegistryError),
}

#[derive(Debug)]
struct MockRegistryInner {
    /// The served index.
    spec: Spec,
    /// Library trees keyed by ref path.
    trees: HashMap<String, Vec<LibraryFile>>,
    /// Configured failure, if any.
    fail_on: Option<FailOn>,
    /// Number of fetch_index calls.
    index_fetches: usize,
    /// Library names passed to fetch_contents, in call order.
    content_fetches: Vec<String>,
}

/// Mock registry for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockRegistry {
    name: String,
    inner: Arc<Mutex<MockRegistryInner>>,
}

impl MockRegistry {
    /// Create an empty mock registry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Mutex::new(MockRegistryInner {
                spec: Spec::new(),
                trees: HashMap::new(),
                fail_on: None,
                index_fetches: 0,
                content_fetches: Vec::new(),
            })),
        }
    }

    /// Publish a library in the index and register its tree.
    ///
    /// The ref path is `<registry name>/<library name>`.
    pub fn with_library(self, name: &str, version: &str, files: &[(&str, &str)]) -> Self {
        let path = format!("{}/{}", self.name, name);
        {
            let mut inner = self.inner.lock().unwrap();
            inner.spec.libraries.insert(
                name.to_string(),
                LibraryRef {
                    version: version.to_string(),
                    path: path.clone(),
                },
            );
            inner.trees.insert(
                path,
                files
                    .iter()
                    .map(|(p, c)| LibraryFile {
                        path: PathBuf::from(p),
                        contents: c.as_bytes().to_vec(),
                    })
                    .collect(),
            );
        }
        self
    }

    /// Configure a failure scenario.
    pub fn with_failure(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
        self
    }

    /// Number of times the index was fetched.
    pub fn index_fetches(&self) -> usize {
        self.inner.lock().unwrap().index_fetches
    }

    /// Library names fetched via fetch_contents, in call order.
    pub fn content_fetches(&self) -> Vec<String> {
        self.inner.lock().unwrap().content_fetches.clone()
    }
}

#[async_trait]
impl Registry for MockRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> &'static str {
        "mock"
    }

    async fn fetch_index(&self) -> Result<Spec, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.index_fetches += 1;
        if let Some(FailOn::FetchIndex(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        Ok(inner.spec.clone())
    }

    async fn fetch_contents(
        &self,
        name: &str,
        library_ref: &LibraryRef,
    ) -> Result<Vec<LibraryFile>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.content_fetches.push(name.to_string());
        if let Some(FailOn::FetchContents(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        inner
            .trees
            .get(&library_ref.path)
            .cloned()
            .ok_or_else(|| RegistryError::LibraryNotFound {
                name: name.to_string(),
                path: library_ref.path.clone(),
            })
    }
}
