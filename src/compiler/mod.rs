//! Rule compiler.
//!
//! Turns the declarative schema tree into [`ObjectDescriptor`]s (one per
//! message type, nested included, map entries excluded) and
//! [`MethodDescriptor`]s (one per HTTP binding). Units are compiled in path
//! order and declarations in source order so the output is reproducible.

use std::collections::{HashMap, HashSet};

use http::Method;
use serde::Serialize;

use crate::schema::{
    BindingRef, FieldDecl, FieldType, MessageDecl, OperationSet, SchemaTree, SchemaUnit,
    SchemaWalk,
};

/// Errors raised while compiling a schema tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("{unit}: type {type_name} referenced by {method} is not declared")]
    UnknownType {
        unit: String,
        method: String,
        type_name: String,
    },

    #[error("{unit}: body field {field:?} of {method} is not declared on {type_name}")]
    UnknownBodyField {
        unit: String,
        method: String,
        type_name: String,
        field: String,
    },

    #[error("{unit}: body field {field:?} of {method} is not a message")]
    BodyFieldNotMessage {
        unit: String,
        method: String,
        field: String,
    },

    #[error("{unit}: invalid HTTP verb {verb:?} on {method}")]
    InvalidVerb {
        unit: String,
        method: String,
        verb: String,
    },

    #[error("type {type_name} is declared in both {first} and {second}")]
    DuplicateType {
        type_name: String,
        first: String,
        second: String,
    },
}

/// How a field's value is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar,
    EmbeddedMessage,
    RepeatedEmbeddedMessage,
    /// `map<K, V>`; accepted as opaque and never recursed into.
    Map,
}

/// Compiled rule for one declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
    /// Qualified child type for embedded message kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<String>,
    pub required: OperationSet,
    pub denied: OperationSet,
}

impl FieldRule {
    fn compile(field: &FieldDecl, types: &TypeIndex<'_>) -> Self {
        let (required, denied): (OperationSet, OperationSet) = field
            .options
            .as_ref()
            .map(|o| {
                (
                    o.required.iter().copied().collect(),
                    o.deny.iter().copied().collect(),
                )
            })
            .unwrap_or_default();

        let (kind, child) = match &field.field_type {
            FieldType::Scalar(_) => (FieldKind::Scalar, None),
            FieldType::Message(name) if field.repeated && types.is_map_entry(name) => {
                (FieldKind::Map, None)
            }
            FieldType::Message(name) if field.repeated => {
                (FieldKind::RepeatedEmbeddedMessage, Some(name.clone()))
            }
            FieldType::Message(name) => (FieldKind::EmbeddedMessage, Some(name.clone())),
        };

        FieldRule {
            name: field.name.clone(),
            kind,
            child,
            required,
            denied,
        }
    }
}

/// Compiled description of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDescriptor {
    /// Qualified type name, e.g. `.users.User.Parent`.
    pub name: String,
    /// Path of the unit declaring the type.
    pub unit: String,
    /// File-level permissiveness, used when no binding supplies one.
    pub allow_unknown_fields: bool,
    pub fields: Vec<FieldRule>,
}

/// Where the request body goes for a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySelector {
    /// The binding carries no body.
    None,
    /// `*`: the body is the whole request message.
    Whole,
    /// The body fills the named field of the request message.
    Field(String),
}

impl BodySelector {
    pub fn parse(body: &str) -> Self {
        match body {
            "" => BodySelector::None,
            "*" => BodySelector::Whole,
            field => BodySelector::Field(field.to_string()),
        }
    }
}

/// Compiled description of one HTTP binding of an RPC method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub service: String,
    pub method: String,
    pub index: usize,
    #[serde(serialize_with = "serialize_method")]
    pub http_method: Method,
    pub path_template: String,
    /// `{Service}_{Method}_{index}`.
    pub pattern_id: String,
    pub body: BodySelector,
    /// Type validated against the body; `None` when there is no body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub allow_unknown_fields: bool,
}

fn serialize_method<S: serde::Serializer>(method: &Method, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(method.as_str())
}

/// Everything compiled from one schema unit.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledUnit {
    pub path: String,
    pub objects: Vec<ObjectDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

/// Index of every message declared anywhere in the tree.
struct TypeIndex<'a> {
    messages: HashMap<&'a str, (&'a MessageDecl, &'a str)>,
    map_entries: HashSet<&'a str>,
}

impl<'a> TypeIndex<'a> {
    fn build(walks: &'a [SchemaWalk<'a>]) -> Result<Self, CompileError> {
        let mut index = TypeIndex {
            messages: HashMap::new(),
            map_entries: HashSet::new(),
        };
        for walk in walks {
            let unit = walk.unit.path.as_str();
            for message in walk.messages() {
                if let Some((_, first)) = index.messages.get(message.qualified_name) {
                    return Err(CompileError::DuplicateType {
                        type_name: message.qualified_name.to_string(),
                        first: first.to_string(),
                        second: unit.to_string(),
                    });
                }
                index
                    .messages
                    .insert(message.qualified_name, (message.decl, unit));
            }
            index.map_entries.extend(walk.map_entries());
        }
        Ok(index)
    }

    fn message(&self, name: &str) -> Option<&'a MessageDecl> {
        self.messages.get(name).map(|(decl, _)| *decl)
    }

    fn is_map_entry(&self, name: &str) -> bool {
        self.map_entries.contains(name)
    }
}

/// Compile every unit of the tree.
///
/// Units are ordered by path before compilation; the returned list keeps
/// that order.
pub fn compile(tree: &SchemaTree) -> Result<Vec<CompiledUnit>, CompileError> {
    let mut units: Vec<&SchemaUnit> = tree.units.iter().collect();
    units.sort_by(|a, b| a.path.cmp(&b.path));

    let walks: Vec<SchemaWalk<'_>> = units.into_iter().map(SchemaWalk::new).collect();
    let types = TypeIndex::build(&walks)?;
    let compiled = walks
        .iter()
        .map(|walk| compile_unit(walk, &types))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        units = compiled.len(),
        objects = compiled.iter().map(|u| u.objects.len()).sum::<usize>(),
        bindings = compiled.iter().map(|u| u.methods.len()).sum::<usize>(),
        "Compiled schema tree"
    );

    Ok(compiled)
}

fn compile_unit(walk: &SchemaWalk<'_>, types: &TypeIndex<'_>) -> Result<CompiledUnit, CompileError> {
    let unit = walk.unit;
    let allow_unknown = unit.file_allow_unknown();

    let objects = walk
        .messages()
        .map(|message| ObjectDescriptor {
            name: message.qualified_name.to_string(),
            unit: unit.path.clone(),
            allow_unknown_fields: allow_unknown,
            fields: message
                .decl
                .fields
                .iter()
                .map(|f| FieldRule::compile(f, types))
                .collect(),
        })
        .collect::<Vec<_>>();

    let methods = walk
        .bindings
        .iter()
        .map(|binding| compile_binding(unit, binding, types))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        unit = %unit.path,
        objects = objects.len(),
        bindings = methods.len(),
        "Compiled schema unit"
    );

    Ok(CompiledUnit {
        path: unit.path.clone(),
        objects,
        methods,
    })
}

fn compile_binding(
    unit: &SchemaUnit,
    binding: &BindingRef<'_>,
    types: &TypeIndex<'_>,
) -> Result<MethodDescriptor, CompileError> {
    let BindingRef {
        service,
        method,
        index,
        rule,
    } = *binding;
    let method_name = format!("{}.{}", service.name, method.name);

    let verb = rule.pattern.verb();
    let http_method =
        Method::from_bytes(verb.as_bytes()).map_err(|_| CompileError::InvalidVerb {
            unit: unit.path.clone(),
            method: method_name.clone(),
            verb: verb.to_string(),
        })?;

    let body = BodySelector::parse(&rule.body);
    let target = match &body {
        BodySelector::None => None,
        BodySelector::Whole => Some(method.input_type.clone()),
        BodySelector::Field(field) => {
            let input = types
                .message(&method.input_type)
                .ok_or_else(|| CompileError::UnknownType {
                    unit: unit.path.clone(),
                    method: method_name.clone(),
                    type_name: method.input_type.clone(),
                })?;
            let decl = input.fields.iter().find(|f| &f.name == field).ok_or_else(|| {
                CompileError::UnknownBodyField {
                    unit: unit.path.clone(),
                    method: method_name.clone(),
                    type_name: method.input_type.clone(),
                    field: field.clone(),
                }
            })?;
            let child = decl.field_type.message_name().ok_or_else(|| {
                CompileError::BodyFieldNotMessage {
                    unit: unit.path.clone(),
                    method: method_name.clone(),
                    field: field.clone(),
                }
            })?;
            Some(child.to_string())
        }
    };

    Ok(MethodDescriptor {
        service: service.name.clone(),
        method: method.name.clone(),
        index,
        http_method,
        path_template: rule.pattern.path().to_string(),
        pattern_id: format!("{}_{}_{}", service.name, method.name, index),
        body,
        target,
        allow_unknown_fields: unit.allow_unknown_for(service, method),
    })
}
