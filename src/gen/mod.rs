//! gen
//!
//! Generated library emission from a schema.
//!
//! # Output layout
//!
//! ```text
//! <output_root>/
//!   k.libsonnet                    Umbrella aggregator, partitioned by group
//!   manifest.json                  Schema version + per-file content hashes
//!   <group>/<version>/<kind>.libsonnet   One constructor module per kind
//! ```
//!
//! # Determinism
//!
//! Identical schema input yields byte-identical output: the schema iterates
//! in name order, modules are planned into ordered maps, and emitted text
//! contains nothing run-dependent (the only provenance stamp is the schema
//! version). Generation is total: the output root is fully replaced on every
//! run, never patched, because schema changes can alter type identity in
//! ways that make incremental diffing unsafe.
//!
//! # Self-reference
//!
//! Types reference each other by name and constructors accept referenced
//! values as opaque parameters, so cyclic type graphs terminate without
//! cycle bookkeeping: emission visits each named type exactly once and
//! never expands references, producing exactly one module per type.

pub mod naming;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::schema::{Schema, SchemaType, TypeKind};
use self::naming::{escape_identifier, module_file_name};

/// File name of the umbrella aggregator.
pub const AGGREGATOR_FILE: &str = "k.libsonnet";

/// File name of the provenance manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors from library generation.
#[derive(Debug, Error)]
pub enum GenError {
    /// Writing the generated tree failed.
    #[error("failed to write generated library at {path}: {reason}")]
    Write {
        /// The path that failed
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },

    /// Two distinct types normalize to the same emitted module.
    #[error("name collision: types '{first}' and '{second}' both emit '{emitted}'")]
    NameCollision {
        /// First offending type
        first: String,
        /// Second offending type
        second: String,
        /// The shared emitted path
        emitted: String,
    },
}

/// The result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedLibrary {
    /// Version label of the schema that produced this library
    pub schema_version: String,
    /// Where the library was published
    pub output_root: PathBuf,
    /// Relative path -> SHA-256 content hash for every emitted file
    pub files: BTreeMap<String, String>,
}

/// Generate a typed library from a schema, publishing it at `output_root`.
///
/// Any pre-existing content at the root is fully replaced. The tree is
/// staged in a temporary sibling directory and swapped into place in one
/// rename, so a failed run never leaves a partial library visible.
///
/// # Errors
///
/// - [`GenError::NameCollision`] naming both offending types
/// - [`GenError::Write`] for filesystem failures
pub fn generate(schema: &Schema, output_root: &Path) -> Result<GeneratedLibrary, GenError> {
    let contents = plan(schema)?;
    debug!(
        schema_version = %schema.version(),
        modules = contents.len(),
        "generating library"
    );

    let files: BTreeMap<String, String> = contents
        .iter()
        .map(|(path, content)| (path.clone(), sha256_hex(content.as_bytes())))
        .collect();

    let manifest = render_manifest(schema.version(), &files);
    publish(output_root, &contents, &manifest)?;

    Ok(GeneratedLibrary {
        schema_version: schema.version().to_string(),
        output_root: output_root.to_path_buf(),
        files,
    })
}

/// Plan every emitted file: one module per top-level object kind plus the
/// aggregator. Pure; does no I/O.
fn plan(schema: &Schema) -> Result<BTreeMap<String, String>, GenError> {
    // Emitted module path -> originating type. Doubles as the emission memo
    // (the schema iterates each type once, by name) and as the collision
    // detector.
    let mut owners: BTreeMap<String, String> = BTreeMap::new();
    // (group, version) -> module paths, for the aggregator.
    let mut groups: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();

    let mut contents: BTreeMap<String, String> = BTreeMap::new();

    for t in schema.top_level_objects() {
        if t.kind != TypeKind::Object {
            continue;
        }
        let gvk = t.gvk.as_ref().expect("top-level objects carry a GVK");

        let relpath = format!(
            "{}/{}/{}",
            gvk.group_name(),
            gvk.version,
            module_file_name(&gvk.kind)
        );
        if let Some(first) = owners.get(&relpath) {
            return Err(GenError::NameCollision {
                first: first.clone(),
                second: t.name.clone(),
                emitted: relpath,
            });
        }

        contents.insert(relpath.clone(), render_module(schema.version(), t));
        owners.insert(relpath.clone(), t.name.clone());
        groups
            .entry((gvk.group_name().to_string(), gvk.version.clone()))
            .or_default()
            .push(relpath);
    }

    contents.insert(
        AGGREGATOR_FILE.to_string(),
        render_aggregator(schema.version(), &groups),
    );
    Ok(contents)
}

/// Render one kind's constructor module.
///
/// The constructor is named after the kind and takes the type's required
/// fields as parameters, in declared order. The conventional `name` field
/// routes to `metadata.name`; `apiVersion` and `kind` are supplied by the
/// tag and never become parameters; every other required field is set as a
/// same-named top-level field.
fn render_module(schema_version: &str, t: &SchemaType) -> String {
    let gvk = t.gvk.as_ref().expect("render_module requires a GVK");

    let params: Vec<(String, &str)> = t
        .required_fields()
        .filter(|f| f.name != "apiVersion" && f.name != "kind")
        .map(|f| (escape_identifier(&f.name), f.name.as_str()))
        .collect();

    let mut out = String::new();
    out.push_str(&header(schema_version));
    out.push_str("{\n");
    out.push_str(&format!(
        "  {}({}):: {{\n",
        escape_identifier(&gvk.kind),
        params
            .iter()
            .map(|(p, _)| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str(&format!("    apiVersion: \"{}\",\n", gvk.api_version()));
    out.push_str(&format!("    kind: \"{}\",\n", gvk.kind));

    for (param, field) in &params {
        if *field == "name" {
            out.push_str("    metadata: {\n");
            out.push_str(&format!("      name: {},\n", param));
            out.push_str("    },\n");
        } else {
            out.push_str(&format!("    {}: {},\n", escape_identifier(field), param));
        }
    }

    out.push_str("  },\n");
    out.push_str("}\n");
    out
}

/// Render the umbrella aggregator, partitioned by group and version.
fn render_aggregator(
    schema_version: &str,
    groups: &BTreeMap<(String, String), Vec<String>>,
) -> String {
    let mut out = String::new();
    out.push_str(&header(schema_version));
    out.push_str("{\n");

    let mut current_group: Option<&str> = None;
    for ((group, version), modules) in groups {
        if current_group != Some(group.as_str()) {
            if current_group.is_some() {
                out.push_str("  },\n");
            }
            out.push_str(&format!("  {}:: {{\n", escape_identifier(group)));
            current_group = Some(group);
        }
        out.push_str(&format!("    {}::\n", escape_identifier(version)));
        let imports: Vec<String> = modules
            .iter()
            .map(|m| format!("      (import \"{}\")", m))
            .collect();
        out.push_str(&imports.join(" +\n"));
        out.push_str(",\n");
    }
    if current_group.is_some() {
        out.push_str("  },\n");
    }

    out.push_str("}\n");
    out
}

/// Render the provenance manifest.
fn render_manifest(schema_version: &str, files: &BTreeMap<String, String>) -> String {
    let manifest = serde_json::json!({
        "schemaVersion": schema_version,
        "files": files,
    });
    let mut json = serde_json::to_string_pretty(&manifest).expect("manifest serializes");
    json.push('\n');
    json
}

fn header(schema_version: &str) -> String {
    format!(
        "// Generated by konstruct from schema {}. Do not edit.\n",
        schema_version
    )
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Write the planned tree to a staging directory and swap it into place.
fn publish(
    output_root: &Path,
    contents: &BTreeMap<String, String>,
    manifest: &str,
) -> Result<(), GenError> {
    let write_err = |path: &Path, e: std::io::Error| GenError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let parent = match output_root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".lib-stage-")
        .tempdir_in(parent)
        .map_err(|e| write_err(parent, e))?;

    for (relpath, content) in contents {
        let dest = staging.path().join(relpath);
        if let Some(dir) = dest.parent() {
            std::fs::create_dir_all(dir).map_err(|e| write_err(dir, e))?;
        }
        std::fs::write(&dest, content).map_err(|e| write_err(&dest, e))?;
    }
    let manifest_path = staging.path().join(MANIFEST_FILE);
    std::fs::write(&manifest_path, manifest).map_err(|e| write_err(&manifest_path, e))?;

    if output_root.exists() {
        std::fs::remove_dir_all(output_root).map_err(|e| write_err(output_root, e))?;
    }
    let staged = staging.keep();
    if let Err(e) = std::fs::rename(&staged, output_root) {
        let _ = std::fs::remove_dir_all(&staged);
        return Err(write_err(output_root, e));
    }
    Ok(())
}
