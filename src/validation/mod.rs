//! Request body validation.
//!
//! Validators are built once from compiled units and then shared read-only
//! across requests. Each call is a pure function of the context, the document
//! and the path; the first failure is returned and nothing is aggregated.
//!
//! # Usage
//!
//! ```ignore
//! use atlas_validate::{compiler, validation::{HookRegistry, ValidationContext, Validators}};
//!
//! let units = compiler::compile(&tree)?;
//! let validators = Validators::link(&units, &HookRegistry::new())?;
//! let ctx = ValidationContext::new().with_method(http::Method::POST);
//! validators.validate(".users.User", &ctx, &serde_json::json!({"id": "1"}), "")?;
//! ```

mod binding;
mod context;
mod error;
mod hooks;
mod object;

pub use binding::BindingValidator;
pub use context::{ValidationContext, index_path, join_path};
pub use error::ValidationError;
pub use hooks::{HookRegistry, JsonValidator, PreValidateHook};
pub use object::{ObjectValidator, Validators};
