//! Structural validators and required/denied policy checks.
//!
//! [`Validators`] links the descriptors of every compiled unit into one
//! immutable table. Child references are resolved once at link time, so a
//! validation call only walks the document and the prebuilt rules.

use std::{collections::HashMap, sync::Arc};

use serde_json::{Map, Value};

use super::{
    HookRegistry, JsonValidator, PreValidateHook, ValidationContext, ValidationError,
    context::{index_path, join_path},
};
use crate::compiler::{CompileError, CompiledUnit, FieldKind, FieldRule, ObjectDescriptor};

/// How a type reference is validated.
#[derive(Clone)]
enum Target {
    /// A compiled object, by position in [`Validators::objects`].
    Compiled(usize),
    /// A registered validator for a type no unit compiled.
    Registered(Arc<dyn JsonValidator>),
    /// Nothing can validate the type; accepted as-is.
    Unvalidated,
}

struct LinkedField {
    rule: FieldRule,
    child: Target,
}

struct CompiledObject {
    descriptor: ObjectDescriptor,
    pre_validate: Option<Arc<dyn PreValidateHook>>,
    fields: Vec<LinkedField>,
    by_name: HashMap<String, usize>,
}

impl CompiledObject {
    fn field(&self, name: &str) -> Option<&LinkedField> {
        self.by_name.get(name).map(|i| &self.fields[*i])
    }
}

/// Every compiled object validator, linked across units.
pub struct Validators {
    objects: Vec<CompiledObject>,
    by_name: HashMap<String, usize>,
    registered: HashMap<String, Arc<dyn JsonValidator>>,
}

impl Validators {
    /// Link compiled units and hooks into a validator table.
    ///
    /// Registered validators for types that a unit compiled are ignored; the
    /// compiled validator always wins.
    pub fn link(units: &[CompiledUnit], hooks: &HookRegistry) -> Result<Self, CompileError> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut descriptors: Vec<&ObjectDescriptor> = Vec::new();

        for unit in units {
            for object in &unit.objects {
                if let Some(existing) = by_name.get(&object.name) {
                    return Err(CompileError::DuplicateType {
                        type_name: object.name.clone(),
                        first: descriptors[*existing].unit.clone(),
                        second: unit.path.clone(),
                    });
                }
                by_name.insert(object.name.clone(), descriptors.len());
                descriptors.push(object);
            }
        }

        let mut registered = HashMap::new();
        for name in hooks.validator_names() {
            if by_name.contains_key(name) {
                tracing::warn!(
                    type_name = %name,
                    "Ignoring registered validator for a compiled type"
                );
                continue;
            }
            if let Some(validator) = hooks.validator(name) {
                registered.insert(name.to_string(), validator);
            }
        }

        let resolve = |name: &str| -> Target {
            if let Some(idx) = by_name.get(name) {
                Target::Compiled(*idx)
            } else if let Some(validator) = registered.get(name) {
                Target::Registered(Arc::clone(validator))
            } else {
                Target::Unvalidated
            }
        };

        let objects = descriptors
            .iter()
            .map(|descriptor| {
                let fields: Vec<LinkedField> = descriptor
                    .fields
                    .iter()
                    .map(|rule| LinkedField {
                        child: match (&rule.kind, &rule.child) {
                            (
                                FieldKind::EmbeddedMessage | FieldKind::RepeatedEmbeddedMessage,
                                Some(child),
                            ) => resolve(child),
                            _ => Target::Unvalidated,
                        },
                        rule: rule.clone(),
                    })
                    .collect();
                let by_name = fields
                    .iter()
                    .enumerate()
                    .map(|(i, f)| (f.rule.name.clone(), i))
                    .collect();
                CompiledObject {
                    descriptor: (*descriptor).clone(),
                    pre_validate: hooks.pre_validate(&descriptor.name),
                    fields,
                    by_name,
                }
            })
            .collect();

        Ok(Self {
            objects,
            by_name,
            registered,
        })
    }

    /// Handle to a compiled object validator.
    pub fn object(&self, type_name: &str) -> Option<ObjectValidator<'_>> {
        self.by_name.get(type_name).map(|idx| ObjectValidator {
            validators: self,
            idx: *idx,
        })
    }

    /// Whether any validator (compiled or registered) exists for the type.
    pub fn can_validate(&self, type_name: &str) -> bool {
        !matches!(self.target(type_name), Target::Unvalidated)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Validate a document as an instance of `type_name`.
    ///
    /// This is the cross-unit entry point: compiled types run their
    /// structural validator, registered types their hook, and anything else
    /// is accepted.
    pub fn validate(
        &self,
        type_name: &str,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        self.validate_target(&self.target(type_name), ctx, document, path)
    }

    fn target(&self, type_name: &str) -> Target {
        if let Some(idx) = self.by_name.get(type_name) {
            Target::Compiled(*idx)
        } else if let Some(validator) = self.registered.get(type_name) {
            Target::Registered(Arc::clone(validator))
        } else {
            Target::Unvalidated
        }
    }

    fn validate_target(
        &self,
        target: &Target,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        match target {
            Target::Compiled(idx) => self.validate_object(*idx, ctx, document, path),
            Target::Registered(validator) => validator.validate_json(ctx, document, path),
            Target::Unvalidated => Ok(()),
        }
    }

    fn validate_object(
        &self,
        idx: usize,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        let object = &self.objects[idx];

        let transformed;
        let document = match &object.pre_validate {
            Some(hook) => match hook.pre_validate(ctx, document, path)? {
                Some(replaced) => {
                    transformed = replaced;
                    &transformed
                }
                None => document,
            },
            None => document,
        };

        // A JSON null decodes to an empty mapping.
        let empty = Map::new();
        let fields = match document {
            Value::Object(fields) => fields,
            Value::Null => &empty,
            _ => {
                return Err(ValidationError::ExpectedObject {
                    path: path.to_string(),
                });
            }
        };

        check_policy(object, ctx, fields, path)?;

        let allow_unknown = ctx
            .allow_unknown_fields()
            .unwrap_or(object.descriptor.allow_unknown_fields);

        for (key, value) in fields {
            let Some(field) = object.field(key) else {
                if allow_unknown {
                    continue;
                }
                return Err(ValidationError::UnknownField {
                    path: join_path(path, key),
                });
            };

            if field.rule.kind == FieldKind::Map {
                continue;
            }

            if field.rule.denied.applies_to(ctx.method()) {
                return Err(ValidationError::DeniedFieldPresent {
                    field: key.clone(),
                    method: ctx.method_str().to_string(),
                });
            }

            match field.rule.kind {
                FieldKind::Scalar | FieldKind::Map => {}
                FieldKind::EmbeddedMessage => {
                    if value.is_null() {
                        continue;
                    }
                    self.validate_target(&field.child, ctx, value, &join_path(path, key))?;
                }
                FieldKind::RepeatedEmbeddedMessage => {
                    if value.is_null() {
                        continue;
                    }
                    let array_path = join_path(path, key);
                    let Value::Array(items) = value else {
                        return Err(ValidationError::ExpectedArray { path: array_path });
                    };
                    if matches!(field.child, Target::Unvalidated) {
                        continue;
                    }
                    for (i, item) in items.iter().enumerate() {
                        self.validate_target(
                            &field.child,
                            ctx,
                            item,
                            &index_path(&array_path, i),
                        )?;
                    }
                }
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Validators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validators")
            .field(
                "objects",
                &self
                    .objects
                    .iter()
                    .map(|o| o.descriptor.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("registered", &self.registered.len())
            .finish()
    }
}

/// Required/denied policy for fields absent from the mapping.
///
/// Denied fields are checked while walking present keys instead.
fn check_policy(
    object: &CompiledObject,
    ctx: &ValidationContext,
    fields: &Map<String, Value>,
    path: &str,
) -> Result<(), ValidationError> {
    for field in &object.fields {
        let required = &field.rule.required;
        if required.is_empty() || fields.contains_key(&field.rule.name) {
            continue;
        }
        if required.is_all() || required.applies_to(ctx.method()) {
            return Err(ValidationError::RequiredFieldMissing {
                path: join_path(path, &field.rule.name),
                method: ctx.method_str().to_string(),
            });
        }
    }
    Ok(())
}

/// Entry points for one compiled message type.
#[derive(Clone, Copy)]
pub struct ObjectValidator<'a> {
    validators: &'a Validators,
    idx: usize,
}

impl<'a> ObjectValidator<'a> {
    pub fn descriptor(&self) -> &'a ObjectDescriptor {
        &self.validators.objects[self.idx].descriptor
    }

    /// Structural validation, including the pre-validation hook.
    pub fn validate(
        &self,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        self.validators.validate_object(self.idx, ctx, document, path)
    }

    /// Public wrapper for callers outside the compiled set.
    ///
    /// Behaves exactly like [`validate`](Self::validate); the pre-validation
    /// hook runs once per call.
    pub fn validate_json(
        &self,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        self.validate(ctx, document, path)
    }

    /// Required-field policy check against an already decoded mapping.
    pub fn check_policy(
        &self,
        ctx: &ValidationContext,
        fields: &Map<String, Value>,
        path: &str,
    ) -> Result<(), ValidationError> {
        check_policy(&self.validators.objects[self.idx], ctx, fields, path)
    }
}
