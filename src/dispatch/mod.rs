//! Route table.
//!
//! Every HTTP binding of every compiled unit becomes one [`RouteEntry`]. The
//! table keeps unit path order and declaration order within a unit, and
//! lookups return the first entry whose verb and path template match.

mod pattern;

use std::sync::Arc;

use http::Method;
use serde::Serialize;

pub use pattern::{PathTemplate, PatternError};

use crate::{
    compiler::{self, CompileError, CompiledUnit, MethodDescriptor},
    schema::SchemaTree,
    validation::{BindingValidator, HookRegistry, ValidationContext, ValidationError, Validators},
};

/// Errors raised while building a route table.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("binding {pattern_id}: {source}")]
    Pattern {
        pattern_id: String,
        #[source]
        source: PatternError,
    },
}

/// One HTTP binding with its parsed path template and body validator.
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    #[serde(flatten)]
    descriptor: MethodDescriptor,
    #[serde(skip)]
    pattern: PathTemplate,
    #[serde(skip)]
    validator: BindingValidator,
}

impl RouteEntry {
    fn new(descriptor: &MethodDescriptor) -> Result<Self, DispatchError> {
        let pattern =
            PathTemplate::parse(&descriptor.path_template).map_err(|source| {
                DispatchError::Pattern {
                    pattern_id: descriptor.pattern_id.clone(),
                    source,
                }
            })?;
        Ok(Self {
            descriptor: descriptor.clone(),
            pattern,
            validator: BindingValidator::new(descriptor),
        })
    }

    pub fn pattern_id(&self) -> &str {
        &self.descriptor.pattern_id
    }

    pub fn method(&self) -> &Method {
        &self.descriptor.http_method
    }

    pub fn pattern(&self) -> &PathTemplate {
        &self.pattern
    }

    pub fn allow_unknown_fields(&self) -> bool {
        self.descriptor.allow_unknown_fields
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        &self.descriptor.http_method == method && self.pattern.matches(path)
    }
}

/// Ordered route table shared by every request.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    validators: Arc<Validators>,
}

impl RouteTable {
    /// Compile a schema tree and build its table.
    pub fn from_tree(tree: &SchemaTree, hooks: &HookRegistry) -> Result<Self, DispatchError> {
        let units = compiler::compile(tree)?;
        Self::build(&units, hooks)
    }

    /// Build a table from compiled units.
    ///
    /// Units are ordered by path so the first-match order does not depend on
    /// the order the caller passes them in.
    pub fn build(units: &[CompiledUnit], hooks: &HookRegistry) -> Result<Self, DispatchError> {
        let mut ordered: Vec<&CompiledUnit> = units.iter().collect();
        ordered.sort_by(|a, b| a.path.cmp(&b.path));

        let validators = Validators::link(units, hooks)?;
        let entries = ordered
            .iter()
            .flat_map(|unit| unit.methods.iter())
            .map(RouteEntry::new)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            routes = entries.len(),
            objects = validators.len(),
            "Built validation route table"
        );

        Ok(Self {
            entries,
            validators: Arc::new(validators),
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    /// First entry matching the verb and path.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.entries
            .iter()
            .find(|entry| entry.matches(method, path))
            .map(|entry| RouteMatch { table: self, entry })
    }
}

/// A matched route, ready to validate a request body.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    table: &'a RouteTable,
    entry: &'a RouteEntry,
}

impl<'a> RouteMatch<'a> {
    pub fn entry(&self) -> &'a RouteEntry {
        self.entry
    }

    /// The context handed to validators for this route.
    pub fn context(&self) -> ValidationContext {
        ValidationContext::new()
            .with_method(self.entry.method().clone())
            .with_allow_unknown_fields(self.entry.allow_unknown_fields())
    }

    /// Validate a raw request body against the route's binding.
    pub fn validate(&self, body: &[u8]) -> Result<(), ValidationError> {
        self.entry
            .validator
            .validate(&self.table.validators, &self.context(), body)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::tests::fixtures;

    fn table() -> RouteTable {
        RouteTable::build(&fixtures::compiled(), &HookRegistry::new()).unwrap()
    }

    #[test]
    fn test_entries_in_unit_then_declaration_order() {
        let table = table();
        let ids: Vec<&str> = table.entries().iter().map(RouteEntry::pattern_id).collect();
        assert_eq!(
            ids,
            vec![
                "Audit_Record_0",
                "Users_Create_0",
                "Users_Update_0",
                "Users_Update_1",
                "Users_Get_0",
                "Users_Import_0",
            ]
        );
    }

    #[test]
    fn test_build_order_ignores_input_order() {
        let mut units = fixtures::compiled();
        units.reverse();
        let reversed = RouteTable::build(&units, &HookRegistry::new()).unwrap();
        let ids: Vec<&str> = reversed.entries().iter().map(RouteEntry::pattern_id).collect();
        assert_eq!(ids[0], "Audit_Record_0");
    }

    #[rstest]
    #[case::create(Method::POST, "/v1/users", Some("Users_Create_0"))]
    #[case::update(Method::PATCH, "/v1/users/42", Some("Users_Update_0"))]
    #[case::replace(Method::PUT, "/v1/users/42", Some("Users_Update_1"))]
    #[case::get(Method::GET, "/v1/users/42", Some("Users_Get_0"))]
    #[case::import(Method::POST, "/v1/users:import", Some("Users_Import_0"))]
    #[case::audit(Method::POST, "/v1/audit", Some("Audit_Record_0"))]
    #[case::wrong_verb(Method::DELETE, "/v1/users/42", None)]
    #[case::unknown_path(Method::POST, "/v2/users", None)]
    fn test_find(#[case] method: Method, #[case] path: &str, #[case] expected: Option<&str>) {
        let table = table();
        let found = table.find(&method, path).map(|m| m.entry().pattern_id().to_string());
        assert_eq!(found.as_deref(), expected);
    }

    #[test]
    fn test_first_match_wins() {
        let overlapping = json!({
            "path": "overlap/overlap.proto",
            "package": "overlap",
            "messages": [{ "name": "Thing", "fields": [] }],
            "services": [{
                "name": "Things",
                "methods": [
                    { "name": "Wide", "input_type": ".overlap.Thing",
                      "http": { "post": "/v1/things/*", "body": "*" } },
                    { "name": "Narrow", "input_type": ".overlap.Thing",
                      "options": { "allow_unknown_fields": true },
                      "http": { "post": "/v1/things/special", "body": "*" } }
                ]
            }]
        });
        let table =
            RouteTable::from_tree(&fixtures::tree(vec![overlapping]), &HookRegistry::new())
                .unwrap();

        let matched = table.find(&Method::POST, "/v1/things/special").unwrap();
        assert_eq!(matched.entry().pattern_id(), "Things_Wide_0");
        // The wide binding rejects unknown fields even though the narrow one would not.
        assert_eq!(
            matched.validate(br#"{"x": 1}"#).unwrap_err().to_string(),
            r#"unknown field "x"."#
        );
    }

    #[test]
    fn test_custom_verb_not_caught_by_verbless_binding() {
        let unit = json!({
            "path": "things/things.proto",
            "package": "things",
            "messages": [
                { "name": "Thing", "fields": [{ "name": "id", "type": { "scalar": "string" } }] },
                { "name": "UndeleteRequest",
                  "fields": [{ "name": "reason", "type": { "scalar": "string" } }] }
            ],
            "services": [{
                "name": "S",
                "methods": [
                    { "name": "Update", "input_type": ".things.Thing",
                      "http": { "post": "/v1/things/{id}", "body": "*" } },
                    { "name": "Undelete", "input_type": ".things.UndeleteRequest",
                      "http": { "post": "/v1/things/{id}:undelete", "body": "*" } }
                ]
            }]
        });
        let table =
            RouteTable::from_tree(&fixtures::tree(vec![unit]), &HookRegistry::new()).unwrap();

        let matched = table.find(&Method::POST, "/v1/things/7:undelete").unwrap();
        assert_eq!(matched.entry().pattern_id(), "S_Undelete_0");
        assert!(matched.validate(br#"{"reason": "oops"}"#).is_ok());

        let matched = table.find(&Method::POST, "/v1/things/7").unwrap();
        assert_eq!(matched.entry().pattern_id(), "S_Update_0");
    }

    #[test]
    fn test_context_carries_verb_and_binding_flag() {
        let table = table();
        let ctx = table.find(&Method::POST, "/v1/users:import").unwrap().context();
        assert_eq!(ctx.method(), Some(&Method::POST));
        assert_eq!(ctx.allow_unknown_fields(), Some(true));

        let ctx = table.find(&Method::POST, "/v1/users").unwrap().context();
        assert_eq!(ctx.allow_unknown_fields(), Some(false));
    }

    #[test]
    fn test_validate_uses_binding_target() {
        let table = table();
        let update = table.find(&Method::PATCH, "/v1/users/1").unwrap();
        // Body is the `user` field of UpdateUserRequest, i.e. a User.
        assert!(update.validate(br#"{"id": "1"}"#).is_ok());
        assert_eq!(
            update.validate(br#"{"secret": "s"}"#).unwrap_err(),
            ValidationError::DeniedFieldPresent {
                field: "secret".into(),
                method: "PATCH".into()
            }
        );
    }

    #[test]
    fn test_invalid_path_template() {
        let bad = json!({
            "path": "bad/bad.proto",
            "package": "bad",
            "messages": [{ "name": "Thing", "fields": [] }],
            "services": [{
                "name": "Things",
                "methods": [{ "name": "Make", "input_type": ".bad.Thing",
                              "http": { "post": "v1/things", "body": "*" } }]
            }]
        });
        let err = RouteTable::from_tree(&fixtures::tree(vec![bad]), &HookRegistry::new())
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Pattern { ref pattern_id, .. } if pattern_id == "Things_Make_0"
        ));
    }

    #[test]
    fn test_serialized_entry() {
        let table = table();
        let value = serde_json::to_value(&table.entries()[1]).unwrap();
        assert_eq!(value["pattern_id"], "Users_Create_0");
        assert_eq!(value["http_method"], "POST");
        assert_eq!(value["path_template"], "/v1/users");
        assert_eq!(value["target"], ".users.User");
        assert_eq!(value["allow_unknown_fields"], false);
    }
}
