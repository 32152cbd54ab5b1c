//! gen::naming
//!
//! Identifier and file naming rules for generated jsonnet.
//!
//! # Renaming rule
//!
//! Generated identifiers come from schema field and kind names, which may
//! collide with jsonnet reserved words or contain characters jsonnet
//! identifiers cannot. The rule, applied identically on every run:
//!
//! 1. Every character outside `[A-Za-z0-9_]` becomes `_`
//! 2. A leading digit gets a `_` prefix
//! 3. A reserved word gets a `_` suffix (`local` -> `local_`)

/// Jsonnet reserved words.
const RESERVED: &[&str] = &[
    "assert",
    "else",
    "error",
    "false",
    "for",
    "function",
    "if",
    "import",
    "importstr",
    "in",
    "local",
    "null",
    "self",
    "super",
    "tailstrict",
    "then",
    "true",
];

/// Whether a word is reserved in jsonnet.
pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

/// Escape a schema name into a valid jsonnet identifier.
///
/// # Example
///
/// ```
/// use konstruct::gen::naming::escape_identifier;
///
/// assert_eq!(escape_identifier("name"), "name");
/// assert_eq!(escape_identifier("local"), "local_");
/// assert_eq!(escape_identifier("x-kubernetes-items"), "x_kubernetes_items");
/// assert_eq!(escape_identifier("1alpha"), "_1alpha");
/// ```
pub fn escape_identifier(name: &str) -> String {
    let mut escaped: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if escaped.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        escaped.insert(0, '_');
    }
    if is_reserved(&escaped) {
        escaped.push('_');
    }
    escaped
}

/// Capitalize a field name for a `with<Field>` setter.
pub fn setter_name(field: &str) -> String {
    let escaped = escape_identifier(field);
    let mut chars = escaped.chars();
    match chars.next() {
        Some(first) => format!("with{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "with".to_string(),
    }
}

/// File name of a kind's generated module.
///
/// Lowercased so module paths look like source files, which is what makes
/// case-insensitive kind collisions detectable at emission time.
pub fn module_file_name(kind: &str) -> String {
    format!("{}.libsonnet", escape_identifier(kind).to_ascii_lowercase())
}
