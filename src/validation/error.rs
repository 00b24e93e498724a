//! Validation errors.
//!
//! A validation call returns at most one error; the first failure aborts the
//! remaining checks. Messages are surfaced verbatim to the caller.

/// Error produced by a validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The document at `path` is not a JSON object.
    #[error("invalid value for {path:?}: expected object.")]
    ExpectedObject { path: String },

    /// The value at `path` is not a JSON array.
    #[error("invalid value for {path:?}: expected array.")]
    ExpectedArray { path: String },

    /// A key that names no declared field.
    #[error("unknown field {path:?}.")]
    UnknownField { path: String },

    /// A field required for the active verb's operation is absent.
    #[error("field {path:?} is required for {method:?} operation.")]
    RequiredFieldMissing { path: String, method: String },

    /// A field denied for the active verb's operation is present.
    #[error("field {field:?} is unsupported for {method:?} operation.")]
    DeniedFieldPresent { field: String, method: String },

    /// A binding without a body selector received a body.
    #[error("body is not allowed")]
    BodyNotAllowed,

    /// Raised by a registered hook.
    #[error("{message}")]
    Hook { path: String, message: String },
}

impl ValidationError {
    /// Error for hooks to return from a custom check.
    pub fn hook(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The document path the error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::ExpectedObject { path }
            | Self::ExpectedArray { path }
            | Self::UnknownField { path }
            | Self::RequiredFieldMissing { path, .. }
            | Self::Hook { path, .. } => Some(path),
            Self::DeniedFieldPresent { field, .. } => Some(field),
            Self::BodyNotAllowed => None,
        }
    }
}
