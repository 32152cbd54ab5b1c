//! schema
//!
//! In-memory Kubernetes API schema model and its acquisition paths.
//!
//! # Responsibilities
//!
//! - [`model`] - Pure data: named types, fields, group/version/kind triples
//! - [`parse`] - Swagger `definitions` subset parsing and validation
//! - [`source`] - Resolving a schema from a release tag, a file, or a cluster
//!
//! # Architecture
//!
//! The schema is a flat mapping from type name to type. References between
//! types are by name and are looked up lazily, so self-referential and
//! mutually recursive types are representable without cycle bookkeeping.

pub mod model;
pub mod parse;
pub mod source;

pub use model::{Field, FieldType, GroupVersionKind, Primitive, Schema, SchemaType, TypeKind};
pub use source::{SchemaSource, SchemaSpecifier};

use thiserror::Error;

/// Errors from schema acquisition, parsing, and validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No published schema artifact exists for the requested release tag.
    #[error("no schema published for release tag '{tag}'")]
    NotFound {
        /// The unrecognized release tag
        tag: String,
    },

    /// The schema bytes could not be parsed.
    #[error("failed to parse schema: {reason}")]
    Parse {
        /// Why parsing failed
        reason: String,
    },

    /// The schema parsed but violates a structural invariant.
    #[error("invalid schema: type '{type_name}': {reason}")]
    Invalid {
        /// The offending type
        type_name: String,
        /// The violated invariant
        reason: String,
    },

    /// The schema origin could not be reached.
    #[error("schema source unreachable: {uri}: {reason}")]
    Unreachable {
        /// The origin that failed (URL or file path)
        uri: String,
        /// The underlying failure
        reason: String,
    },
}
