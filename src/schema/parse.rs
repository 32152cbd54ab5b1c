//! schema::parse
//!
//! Parsing the swagger `definitions` subset into a [`Schema`].
//!
//! # Input shape
//!
//! Only the parts of an OpenAPI v2 document that matter for constructor
//! generation are read:
//!
//! ```json
//! {
//!   "info": { "version": "v1.7.0" },
//!   "definitions": {
//!     "io.k8s.api.core.v1.Pod": {
//!       "type": "object",
//!       "properties": { "name": { "type": "string" } },
//!       "required": ["name"],
//!       "x-kubernetes-group-version-kind": [
//!         { "group": "", "version": "v1", "kind": "Pod" }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Every origin (release tag, file, live cluster) converges on
//! [`parse_swagger`]; validation of the reference graph happens in
//! [`Schema::new`], so malformed bytes surface as [`SchemaError::Parse`] and
//! structural violations as [`SchemaError::Invalid`].

use serde::Deserialize;
use serde_json::Value;

use super::model::{
    Field, FieldType, GroupVersionKind, Primitive, Schema, SchemaType, TypeKind,
};
use super::SchemaError;

/// Prefix of local definition references in swagger documents.
const DEFINITION_REF_PREFIX: &str = "#/definitions/";

#[derive(Debug, Deserialize)]
struct SwaggerDoc {
    #[serde(default)]
    info: Option<SwaggerInfo>,
    #[serde(default)]
    definitions: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SwaggerInfo {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SwaggerDefinition {
    #[serde(rename = "type", default)]
    type_: Option<String>,
    #[serde(rename = "$ref", default)]
    reference: Option<String>,
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    items: Option<Box<SwaggerProperty>>,
    #[serde(rename = "x-kubernetes-group-version-kind", default)]
    gvk: Vec<GvkEntry>,
}

#[derive(Debug, Deserialize)]
struct SwaggerProperty {
    #[serde(rename = "type", default)]
    type_: Option<String>,
    #[serde(rename = "$ref", default)]
    reference: Option<String>,
    #[serde(default)]
    items: Option<Box<SwaggerProperty>>,
}

#[derive(Debug, Deserialize)]
struct GvkEntry {
    #[serde(default)]
    group: String,
    version: String,
    kind: String,
}

/// Parse swagger bytes into a validated [`Schema`].
///
/// The schema's version label is taken from the document's `info.version`
/// when present, else from `fallback_version` (the release tag for `version:`
/// specifiers, the path for files).
///
/// # Errors
///
/// - [`SchemaError::Parse`] for malformed JSON or unrepresentable types
/// - [`SchemaError::Invalid`] from [`Schema::new`] validation
pub fn parse_swagger(bytes: &[u8], fallback_version: &str) -> Result<Schema, SchemaError> {
    let doc: SwaggerDoc = serde_json::from_slice(bytes).map_err(|e| SchemaError::Parse {
        reason: e.to_string(),
    })?;

    let version = doc
        .info
        .and_then(|i| i.version)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback_version.to_string());

    let mut types = Vec::with_capacity(doc.definitions.len());
    for (name, raw) in doc.definitions {
        let def: SwaggerDefinition =
            serde_json::from_value(raw).map_err(|e| SchemaError::Parse {
                reason: format!("definition '{}': {}", name, e),
            })?;
        types.push(definition_to_type(&name, def)?);
    }

    Schema::new(version, types)
}

/// Translate one swagger definition into a [`SchemaType`].
fn definition_to_type(name: &str, def: SwaggerDefinition) -> Result<SchemaType, SchemaError> {
    let gvk = def.gvk.into_iter().next().map(|entry| GroupVersionKind {
        group: entry.group,
        version: entry.version,
        kind: entry.kind,
    });

    // Aliases: a bare $ref with no properties of its own.
    if let Some(reference) = &def.reference {
        let target = strip_ref(name, reference)?;
        return Ok(SchemaType {
            name: name.to_string(),
            kind: TypeKind::Reference(target),
            fields: vec![],
            gvk,
        });
    }

    match def.type_.as_deref() {
        // Objects (explicit, or implied by a properties block).
        Some("object") | None => {
            let mut fields = Vec::with_capacity(def.properties.len());
            for (field_name, raw) in def.properties {
                let prop: SwaggerProperty =
                    serde_json::from_value(raw).map_err(|e| SchemaError::Parse {
                        reason: format!("definition '{}' field '{}': {}", name, field_name, e),
                    })?;
                let field_type = property_type(name, &field_name, &prop)?;
                let required = def.required.iter().any(|r| r == &field_name);
                fields.push(Field {
                    name: field_name,
                    field_type,
                    required,
                });
            }
            Ok(SchemaType {
                name: name.to_string(),
                kind: TypeKind::Object,
                fields,
                gvk,
            })
        }
        Some("array") => {
            let items = def.items.ok_or_else(|| SchemaError::Parse {
                reason: format!("definition '{}': array without items", name),
            })?;
            let elem = property_type(name, "items", &items)?;
            Ok(SchemaType {
                name: name.to_string(),
                kind: TypeKind::Array(elem),
                fields: vec![],
                gvk,
            })
        }
        Some(primitive) => {
            let p = Primitive::parse(primitive).ok_or_else(|| SchemaError::Parse {
                reason: format!("definition '{}': unknown type '{}'", name, primitive),
            })?;
            Ok(SchemaType {
                name: name.to_string(),
                kind: TypeKind::Primitive(p),
                fields: vec![],
                gvk,
            })
        }
    }
}

/// Translate one property into a [`FieldType`].
fn property_type(
    type_name: &str,
    field_name: &str,
    prop: &SwaggerProperty,
) -> Result<FieldType, SchemaError> {
    if let Some(reference) = &prop.reference {
        return Ok(FieldType::Named(strip_ref(type_name, reference)?));
    }

    match prop.type_.as_deref() {
        Some("array") => {
            let items = prop.items.as_deref().ok_or_else(|| SchemaError::Parse {
                reason: format!(
                    "definition '{}' field '{}': array without items",
                    type_name, field_name
                ),
            })?;
            let elem = property_type(type_name, field_name, items)?;
            Ok(FieldType::Array(Box::new(elem)))
        }
        Some(primitive) => {
            let p = Primitive::parse(primitive).ok_or_else(|| SchemaError::Parse {
                reason: format!(
                    "definition '{}' field '{}': unknown type '{}'",
                    type_name, field_name, primitive
                ),
            })?;
            Ok(FieldType::Primitive(p))
        }
        // Neither $ref nor type: treat as a free-form object.
        None => Ok(FieldType::Primitive(Primitive::Object)),
    }
}

/// Strip the `#/definitions/` prefix from a reference.
fn strip_ref(type_name: &str, reference: &str) -> Result<String, SchemaError> {
    reference
        .strip_prefix(DEFINITION_REF_PREFIX)
        .map(str::to_string)
        .ok_or_else(|| SchemaError::Parse {
            reason: format!(
                "definition '{}': unsupported reference '{}'",
                type_name, reference
            ),
        })
}
