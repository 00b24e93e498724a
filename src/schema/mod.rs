//! Parsed schema tree supplied by the schema-compiler host.
//!
//! The host hands over one [`SchemaUnit`] per compiled file. Every type here is
//! deserializable so a tree can also be loaded from a JSON document (see
//! [`loader`]).
//!
//! # Example
//!
//! ```json
//! {
//!   "units": [{
//!     "path": "users/users.proto",
//!     "package": "users",
//!     "options": { "allow_unknown_fields": false },
//!     "messages": [{
//!       "name": "User",
//!       "fields": [
//!         { "name": "id", "type": { "scalar": "string" } },
//!         { "name": "name", "type": { "scalar": "string" },
//!           "options": { "required": ["create"] } }
//!       ]
//!     }],
//!     "services": []
//!   }]
//! }
//! ```

pub mod loader;
mod options;
mod walker;

use serde::{Deserialize, Serialize};

pub use loader::{SchemaLoadError, load_schema_files};
pub use options::{
    FieldValidateOption, FileValidateOption, MethodValidateOption, Operation, OperationSet,
    ServiceValidateOption, resolve_allow_unknown,
};
pub use walker::{BindingRef, MessageRef, SchemaWalk};

/// The complete input to a compilation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaTree {
    #[serde(default)]
    pub units: Vec<SchemaUnit>,
}

impl SchemaTree {
    pub fn new(units: Vec<SchemaUnit>) -> Self {
        Self { units }
    }
}

/// One compiled schema file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaUnit {
    /// Unit path, e.g. `users/users.proto`. Used for deterministic ordering.
    pub path: String,

    /// Package name without a leading dot.
    #[serde(default)]
    pub package: String,

    /// File-scoped validation options.
    #[serde(default)]
    pub options: Option<FileValidateOption>,

    /// Top-level message declarations, in declaration order.
    #[serde(default)]
    pub messages: Vec<MessageDecl>,

    /// Service declarations, in declaration order.
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
}

impl SchemaUnit {
    /// Qualified name prefix for top-level declarations, e.g. `.users`.
    pub fn scope(&self) -> String {
        if self.package.is_empty() {
            String::new()
        } else {
            format!(".{}", self.package)
        }
    }
}

/// A message type declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageDecl {
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldDecl>,

    #[serde(default)]
    pub nested: Vec<MessageDecl>,

    /// Set on the synthetic entry type generated for a `map<K, V>` field.
    #[serde(default)]
    pub map_entry: bool,
}

/// A field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub repeated: bool,

    #[serde(default)]
    pub options: Option<FieldValidateOption>,
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Any non-message type (`string`, `int32`, enums, ...).
    Scalar(String),
    /// A message type, referenced by its qualified name (`.pkg.Type`).
    Message(String),
}

impl FieldType {
    pub fn message_name(&self) -> Option<&str> {
        match self {
            FieldType::Message(name) => Some(name),
            FieldType::Scalar(_) => None,
        }
    }
}

/// A service declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceDecl {
    pub name: String,

    #[serde(default)]
    pub options: Option<ServiceValidateOption>,

    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

/// An RPC method declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    pub name: String,

    /// Qualified request type name.
    pub input_type: String,

    /// Qualified response type name.
    #[serde(default)]
    pub output_type: String,

    #[serde(default)]
    pub options: Option<MethodValidateOption>,

    /// HTTP binding annotation, if any.
    #[serde(default)]
    pub http: Option<HttpRule>,
}

/// HTTP binding annotation of a method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRule {
    #[serde(flatten)]
    pub pattern: HttpPattern,

    /// Body selector: empty for none, `*` for the whole request, otherwise a
    /// field name of the request type.
    #[serde(default)]
    pub body: String,

    /// Further bindings for the same method. Nested additional bindings are
    /// not allowed and are ignored.
    #[serde(default)]
    pub additional_bindings: Vec<HttpRule>,
}

impl HttpRule {
    /// This rule followed by its additional bindings, in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = &HttpRule> {
        std::iter::once(self).chain(self.additional_bindings.iter())
    }
}

/// Verb and path template of an HTTP binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpPattern {
    Get(String),
    Put(String),
    Post(String),
    Delete(String),
    Patch(String),
    Custom { kind: String, path: String },
}

impl HttpPattern {
    /// HTTP verb as written in the request line.
    pub fn verb(&self) -> &str {
        match self {
            HttpPattern::Get(_) => "GET",
            HttpPattern::Put(_) => "PUT",
            HttpPattern::Post(_) => "POST",
            HttpPattern::Delete(_) => "DELETE",
            HttpPattern::Patch(_) => "PATCH",
            HttpPattern::Custom { kind, .. } => kind,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            HttpPattern::Get(path)
            | HttpPattern::Put(path)
            | HttpPattern::Post(path)
            | HttpPattern::Delete(path)
            | HttpPattern::Patch(path)
            | HttpPattern::Custom { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_unit() {
        let unit: SchemaUnit = serde_json::from_value(json!({
            "path": "users/users.proto",
            "package": "users",
            "options": { "allow_unknown_fields": true },
            "messages": [{
                "name": "User",
                "fields": [
                    { "name": "id", "type": { "scalar": "string" } },
                    { "name": "tags", "type": { "message": ".users.User.TagsEntry" }, "repeated": true }
                ],
                "nested": [{ "name": "TagsEntry", "map_entry": true }]
            }],
            "services": [{
                "name": "Users",
                "methods": [{
                    "name": "Create",
                    "input_type": ".users.User",
                    "http": { "post": "/v1/users", "body": "*" }
                }]
            }]
        }))
        .unwrap();

        assert_eq!(unit.scope(), ".users");
        assert!(unit.options.unwrap().allow_unknown_fields);
        assert_eq!(
            unit.messages[0].fields[1].field_type.message_name(),
            Some(".users.User.TagsEntry")
        );
        let rule = unit.services[0].methods[0].http.as_ref().unwrap();
        assert_eq!(rule.pattern.verb(), "POST");
        assert_eq!(rule.pattern.path(), "/v1/users");
        assert_eq!(rule.body, "*");
    }

    #[test]
    fn test_custom_pattern_and_additional_bindings() {
        let rule: HttpRule = serde_json::from_value(json!({
            "custom": { "kind": "HEAD", "path": "/v1/ping" },
            "additional_bindings": [{ "get": "/v1/ping" }]
        }))
        .unwrap();

        let verbs: Vec<_> = rule.bindings().map(|b| b.pattern.verb()).collect();
        assert_eq!(verbs, vec!["HEAD", "GET"]);
    }

    #[test]
    fn test_empty_package_scope() {
        let unit = SchemaUnit {
            path: "a.proto".into(),
            ..Default::default()
        };
        assert_eq!(unit.scope(), "");
    }
}
