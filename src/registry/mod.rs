//! registry
//!
//! Abstraction for library registries.
//!
//! # Design
//!
//! A registry is a published, versioned index mapping library names to
//! retrievable locations. The [`Registry`] trait is the only surface the
//! resolver sees; the filesystem and HTTP backends stay behind it, and a
//! deterministic in-memory mock backs the resolver's tests.
//!
//! - [`spec`] - The index wire format (`Spec`, `LibraryRef`)
//! - [`traits`] - The `Registry` capability trait and `RegistryError`
//! - [`fs`] - Local filesystem backend
//! - [`http`] - Remote hosted backend
//! - [`mock`] - In-memory backend for deterministic testing
//! - [`factory`] - Protocol selection and backend construction

pub mod factory;
pub mod fs;
pub mod http;
pub mod mock;
pub mod spec;
pub mod traits;

pub use factory::{create_registry, RegistryProtocol};
pub use fs::FsRegistry;
pub use http::HttpRegistry;
pub use spec::{LibraryRef, Spec, INDEX_FILE};
pub use traits::{LibraryFile, Registry, RegistryError};
