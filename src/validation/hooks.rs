//! Capability hooks registered per message type at initialization.
//!
//! Two hooks exist:
//! - [`PreValidateHook`]: runs before structural validation of a compiled
//!   type and may replace the document or reject it.
//! - [`JsonValidator`]: fully replaces validation of a type that no unit
//!   compiled (well-known types, hand-written messages, ...).
//!
//! A type without a registered validator and without a compiled descriptor is
//! accepted without checks.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;

use super::{ValidationContext, ValidationError};

/// Transform applied to a document before structural validation.
pub trait PreValidateHook: Send + Sync {
    /// Return `Ok(None)` to keep the document, `Ok(Some(doc))` to replace it.
    fn pre_validate(
        &self,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<Option<Value>, ValidationError>;
}

impl<F> PreValidateHook for F
where
    F: Fn(&ValidationContext, &Value, &str) -> Result<Option<Value>, ValidationError>
        + Send
        + Sync,
{
    fn pre_validate(
        &self,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<Option<Value>, ValidationError> {
        self(ctx, document, path)
    }
}

/// Validator for a type outside the compiled set.
pub trait JsonValidator: Send + Sync {
    fn validate_json(
        &self,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<(), ValidationError>;
}

impl<F> JsonValidator for F
where
    F: Fn(&ValidationContext, &Value, &str) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate_json(
        &self,
        ctx: &ValidationContext,
        document: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        self(ctx, document, path)
    }
}

/// Hooks keyed by qualified type name.
#[derive(Clone, Default)]
pub struct HookRegistry {
    pre_validate: HashMap<String, Arc<dyn PreValidateHook>>,
    validators: HashMap<String, Arc<dyn JsonValidator>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pre-validation transform for a compiled type.
    pub fn with_pre_validate(
        mut self,
        type_name: impl Into<String>,
        hook: impl PreValidateHook + 'static,
    ) -> Self {
        self.pre_validate.insert(type_name.into(), Arc::new(hook));
        self
    }

    /// Register a validator for a type no unit compiles.
    pub fn with_validator(
        mut self,
        type_name: impl Into<String>,
        validator: impl JsonValidator + 'static,
    ) -> Self {
        self.validators.insert(type_name.into(), Arc::new(validator));
        self
    }

    pub fn pre_validate(&self, type_name: &str) -> Option<Arc<dyn PreValidateHook>> {
        self.pre_validate.get(type_name).cloned()
    }

    pub fn validator(&self, type_name: &str) -> Option<Arc<dyn JsonValidator>> {
        self.validators.get(type_name).cloned()
    }

    pub(crate) fn validator_names(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pre: Vec<_> = self.pre_validate.keys().collect();
        pre.sort();
        let mut validators: Vec<_> = self.validators.keys().collect();
        validators.sort();
        f.debug_struct("HookRegistry")
            .field("pre_validate", &pre)
            .field("validators", &validators)
            .finish()
    }
}
