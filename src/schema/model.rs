//! schema::model
//!
//! Pure in-memory representation of an API schema.
//!
//! # Design
//!
//! A [`Schema`] is an immutable, name-keyed collection of [`SchemaType`]s.
//! Field types reference other types *by name* rather than by embedding them,
//! so cyclic type graphs (self-referential specs) are representable and every
//! lookup is a flat map access. Construction validates the reference graph
//! once; after that the schema is never mutated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SchemaError;

/// A group/version/kind triple identifying a top-level API object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionKind {
    /// API group (empty or "core" for the core group)
    pub group: String,
    /// API version within the group (e.g. "v1")
    pub version: String,
    /// Object kind (e.g. "Pod")
    pub kind: String,
}

impl GroupVersionKind {
    /// The `apiVersion` value stamped on constructed objects.
    ///
    /// Core-group objects use the bare version; all other groups use
    /// `<group>/<version>`.
    ///
    /// # Example
    ///
    /// ```
    /// use konstruct::schema::GroupVersionKind;
    ///
    /// let core = GroupVersionKind {
    ///     group: "core".to_string(),
    ///     version: "v1".to_string(),
    ///     kind: "Pod".to_string(),
    /// };
    /// assert_eq!(core.api_version(), "v1");
    ///
    /// let apps = GroupVersionKind {
    ///     group: "apps".to_string(),
    ///     version: "v1beta1".to_string(),
    ///     kind: "Deployment".to_string(),
    /// };
    /// assert_eq!(apps.api_version(), "apps/v1beta1");
    /// ```
    pub fn api_version(&self) -> String {
        if self.group.is_empty() || self.group == "core" {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// The group name used for partitioning generated modules.
    ///
    /// The empty group is normalized to "core".
    pub fn group_name(&self) -> &str {
        if self.group.is_empty() {
            "core"
        } else {
            &self.group
        }
    }
}

impl std::fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.group_name(), self.version, self.kind)
    }
}

/// Primitive scalar categories a field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// UTF-8 string
    String,
    /// Integer number
    Integer,
    /// Floating-point number
    Number,
    /// Boolean
    Boolean,
    /// Free-form object (no declared shape)
    Object,
}

impl Primitive {
    /// Parse a swagger `type` value into a primitive category.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Primitive::String),
            "integer" => Some(Primitive::Integer),
            "number" => Some(Primitive::Number),
            "boolean" => Some(Primitive::Boolean),
            "object" => Some(Primitive::Object),
            _ => None,
        }
    }
}

/// The type carried by a field: a primitive, a named reference, or an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A primitive scalar
    Primitive(Primitive),
    /// A reference to another named type in the same schema
    Named(String),
    /// An array of some element type
    Array(Box<FieldType>),
}

impl FieldType {
    /// The named type this field type ultimately references, if any.
    ///
    /// Arrays are unwrapped; primitives reference nothing.
    pub fn referenced_name(&self) -> Option<&str> {
        match self {
            FieldType::Primitive(_) => None,
            FieldType::Named(name) => Some(name),
            FieldType::Array(elem) => elem.referenced_name(),
        }
    }
}

/// A single named field of an object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name as declared in the schema
    pub name: String,
    /// The field's type
    pub field_type: FieldType,
    /// Whether the field is required
    pub required: bool,
}

/// The structural category of a schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// An object with declared fields
    Object,
    /// An array of some element type
    Array(FieldType),
    /// A bare primitive alias (e.g. a timestamp modeled as a string)
    Primitive(Primitive),
    /// An alias for another named type
    Reference(String),
}

/// One named type in a schema.
///
/// `fields` is only populated for [`TypeKind::Object`] and preserves the
/// schema's declared field order, which fixes generated constructor
/// parameter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaType {
    /// Type name, unique within its schema
    pub name: String,
    /// Structural category
    pub kind: TypeKind,
    /// Declared fields, in declaration order (objects only)
    pub fields: Vec<Field>,
    /// Present iff this is a top-level API object
    pub gvk: Option<GroupVersionKind>,
}

impl SchemaType {
    /// The required fields, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Whether this type is a top-level API object (has a GVK).
    pub fn is_top_level(&self) -> bool {
        self.gvk.is_some()
    }
}

/// An immutable, validated API schema.
///
/// Keyed by type name; iteration order is name order, which makes every
/// downstream walk deterministic.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Version label used for provenance stamping of generated output.
    version: String,
    /// All types, keyed by name.
    types: BTreeMap<String, SchemaType>,
}

impl Schema {
    /// Build a schema from a set of types, validating its invariants.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::Invalid`] naming the offending type if:
    ///   - two types share a name
    ///   - any reference names a type absent from the schema
    ///   - a top-level object has an empty group/version/kind component
    pub fn new(version: impl Into<String>, types: Vec<SchemaType>) -> Result<Self, SchemaError> {
        let mut by_name = BTreeMap::new();
        for t in types {
            let name = t.name.clone();
            if by_name.insert(name.clone(), t).is_some() {
                return Err(SchemaError::Invalid {
                    type_name: name,
                    reason: "duplicate type name".to_string(),
                });
            }
        }

        let schema = Self {
            version: version.into(),
            types: by_name,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// The schema's version label.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    /// Iterate all types in name order.
    pub fn types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values()
    }

    /// Iterate the top-level API objects in name order.
    pub fn top_level_objects(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values().filter(|t| t.is_top_level())
    }

    /// Number of types in the schema.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the schema contains no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Validate reference resolution and GVK completeness.
    fn validate(&self) -> Result<(), SchemaError> {
        for t in self.types.values() {
            // Every name-based reference must resolve within this schema.
            let check = |referenced: &str| -> Result<(), SchemaError> {
                if self.types.contains_key(referenced) {
                    Ok(())
                } else {
                    Err(SchemaError::Invalid {
                        type_name: t.name.clone(),
                        reason: format!("reference to unknown type '{}'", referenced),
                    })
                }
            };

            match &t.kind {
                TypeKind::Reference(target) => check(target)?,
                TypeKind::Array(elem) => {
                    if let Some(name) = elem.referenced_name() {
                        check(name)?;
                    }
                }
                TypeKind::Object | TypeKind::Primitive(_) => {}
            }

            for field in &t.fields {
                if let Some(name) = field.field_type.referenced_name() {
                    check(name)?;
                }
            }

            // Top-level objects must carry a complete GVK triple.
            if let Some(gvk) = &t.gvk {
                if gvk.version.is_empty() || gvk.kind.is_empty() {
                    return Err(SchemaError::Invalid {
                        type_name: t.name.clone(),
                        reason: "top-level object with incomplete group/version/kind".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, fields: Vec<Field>, gvk: Option<GroupVersionKind>) -> SchemaType {
        SchemaType {
            name: name.to_string(),
            kind: TypeKind::Object,
            fields,
            gvk,
        }
    }

    fn string_field(name: &str, required: bool) -> Field {
        Field {
            name: name.to_string(),
            field_type: FieldType::Primitive(Primitive::String),
            required,
        }
    }

    fn pod_gvk() -> GroupVersionKind {
        GroupVersionKind {
            group: "core".to_string(),
            version: "v1".to_string(),
            kind: "Pod".to_string(),
        }
    }

    #[test]
    fn api_version_core_group() {
        assert_eq!(pod_gvk().api_version(), "v1");

        let empty_group = GroupVersionKind {
            group: String::new(),
            version: "v1".to_string(),
            kind: "Service".to_string(),
        };
        assert_eq!(empty_group.api_version(), "v1");
        assert_eq!(empty_group.group_name(), "core");
    }

    #[test]
    fn api_version_named_group() {
        let gvk = GroupVersionKind {
            group: "apps".to_string(),
            version: "v1beta1".to_string(),
            kind: "Deployment".to_string(),
        };
        assert_eq!(gvk.api_version(), "apps/v1beta1");
        assert_eq!(gvk.to_string(), "apps/v1beta1/Deployment");
    }

    #[test]
    fn primitive_parse() {
        assert_eq!(Primitive::parse("string"), Some(Primitive::String));
        assert_eq!(Primitive::parse("integer"), Some(Primitive::Integer));
        assert_eq!(Primitive::parse("array"), None);
        assert_eq!(Primitive::parse(""), None);
    }

    #[test]
    fn referenced_name_unwraps_arrays() {
        let nested = FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Named(
            "Container".to_string(),
        )))));
        assert_eq!(nested.referenced_name(), Some("Container"));
        assert_eq!(
            FieldType::Primitive(Primitive::String).referenced_name(),
            None
        );
    }

    #[test]
    fn schema_lookup_and_order() {
        let schema = Schema::new(
            "v1.7.0",
            vec![
                object("b.Type", vec![], None),
                object("a.Type", vec![], None),
            ],
        )
        .unwrap();

        assert_eq!(schema.len(), 2);
        assert!(schema.get("a.Type").is_some());
        assert!(schema.get("missing").is_none());

        // Iteration is name-ordered regardless of insertion order.
        let names: Vec<_> = schema.types().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a.Type", "b.Type"]);
    }

    #[test]
    fn duplicate_type_name_rejected() {
        let result = Schema::new(
            "v1",
            vec![object("Pod", vec![], None), object("Pod", vec![], None)],
        );
        assert!(matches!(
            result,
            Err(SchemaError::Invalid { type_name, .. }) if type_name == "Pod"
        ));
    }

    #[test]
    fn dangling_reference_rejected() {
        let pod = object(
            "Pod",
            vec![Field {
                name: "spec".to_string(),
                field_type: FieldType::Named("PodSpec".to_string()),
                required: false,
            }],
            Some(pod_gvk()),
        );

        let result = Schema::new("v1", vec![pod]);
        assert!(matches!(
            result,
            Err(SchemaError::Invalid { type_name, reason })
                if type_name == "Pod" && reason.contains("PodSpec")
        ));
    }

    #[test]
    fn dangling_alias_rejected() {
        let alias = SchemaType {
            name: "PodAlias".to_string(),
            kind: TypeKind::Reference("Pod".to_string()),
            fields: vec![],
            gvk: None,
        };
        assert!(Schema::new("v1", vec![alias]).is_err());
    }

    #[test]
    fn self_reference_is_valid() {
        // JSONSchemaProps-style self-referential type.
        let t = object(
            "Props",
            vec![Field {
                name: "not".to_string(),
                field_type: FieldType::Named("Props".to_string()),
                required: false,
            }],
            None,
        );
        assert!(Schema::new("v1", vec![t]).is_ok());
    }

    #[test]
    fn two_type_cycle_is_valid() {
        let a = object(
            "A",
            vec![Field {
                name: "b".to_string(),
                field_type: FieldType::Named("B".to_string()),
                required: false,
            }],
            None,
        );
        let b = object(
            "B",
            vec![Field {
                name: "a".to_string(),
                field_type: FieldType::Named("A".to_string()),
                required: false,
            }],
            None,
        );
        assert!(Schema::new("v1", vec![a, b]).is_ok());
    }

    #[test]
    fn incomplete_gvk_rejected() {
        let t = object(
            "Pod",
            vec![],
            Some(GroupVersionKind {
                group: "core".to_string(),
                version: String::new(),
                kind: "Pod".to_string(),
            }),
        );
        let result = Schema::new("v1", vec![t]);
        assert!(matches!(
            result,
            Err(SchemaError::Invalid { reason, .. }) if reason.contains("group/version/kind")
        ));
    }

    #[test]
    fn required_fields_preserve_declared_order() {
        let t = object(
            "Pod",
            vec![
                string_field("zeta", true),
                string_field("alpha", false),
                string_field("name", true),
            ],
            Some(pod_gvk()),
        );
        let schema = Schema::new("v1", vec![t]).unwrap();
        let required: Vec<_> = schema
            .get("Pod")
            .unwrap()
            .required_fields()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(required, vec!["zeta", "name"]);
    }

    #[test]
    fn top_level_objects_filters_by_gvk() {
        let schema = Schema::new(
            "v1",
            vec![
                object("Pod", vec![], Some(pod_gvk())),
                object("PodSpec", vec![], None),
            ],
        )
        .unwrap();
        let tops: Vec<_> = schema
            .top_level_objects()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(tops, vec!["Pod"]);
    }
}
