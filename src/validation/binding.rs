use serde::Deserialize;
use serde_json::Value;

use super::{ValidationContext, ValidationError, Validators};
use crate::compiler::{BodySelector, MethodDescriptor};

/// Deepest array/object nesting a request body may have.
pub const MAX_NESTING_DEPTH: usize = 10_000;

/// Validator for the raw body of one HTTP binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingValidator {
    pattern_id: String,
    body: BodySelector,
    target: Option<String>,
}

impl BindingValidator {
    pub fn new(method: &MethodDescriptor) -> Self {
        Self {
            pattern_id: method.pattern_id.clone(),
            body: method.body.clone(),
            target: method.target.clone(),
        }
    }

    pub fn pattern_id(&self) -> &str {
        &self.pattern_id
    }

    /// Validate a raw request body.
    ///
    /// Bindings without a body accept only an empty body. Otherwise the body
    /// is decoded and validated against the target type at the root path.
    pub fn validate(
        &self,
        validators: &Validators,
        ctx: &ValidationContext,
        body: &[u8],
    ) -> Result<(), ValidationError> {
        let Some(target) = &self.target else {
            if !body.is_empty() {
                return Err(ValidationError::BodyNotAllowed);
            }
            return Ok(());
        };

        if !validators.can_validate(target) {
            return Ok(());
        }

        let document = decode_body(body).ok_or(ValidationError::ExpectedObject {
            path: String::new(),
        })?;
        validators.validate(target, ctx, &document, "")
    }
}

/// Decode a request body, or `None` when it is not a single JSON value.
///
/// Numbers keep their source text, so out-of-range values decode. Nesting
/// past serde_json's default limit is allowed up to [`MAX_NESTING_DEPTH`];
/// the parser grows its stack on demand.
fn decode_body(body: &[u8]) -> Option<Value> {
    if nesting_depth(body) > MAX_NESTING_DEPTH {
        return None;
    }
    let mut de = serde_json::Deserializer::from_slice(body);
    de.disable_recursion_limit();
    let document = Value::deserialize(serde_stacker::Deserializer::new(&mut de)).ok()?;
    de.end().ok()?;
    Some(document)
}

/// Maximum bracket nesting of a JSON text, ignoring brackets inside strings.
fn nesting_depth(body: &[u8]) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for &b in body {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}
