//! Structural JSON request validation compiled from annotated schema trees.
//!
//! A [`schema::SchemaTree`] (messages, services, HTTP bindings and validation
//! options) is compiled by [`compiler::compile`] into object and method
//! descriptors. [`dispatch::RouteTable`] links those into validators and an
//! ordered route table, and [`middleware::Interceptor`] runs the first
//! matching route's validator against inbound request bodies.
//!
//! ```ignore
//! use std::sync::Arc;
//! use atlas_validate::{dispatch::RouteTable, middleware, validation::HookRegistry};
//!
//! let tree = atlas_validate::schema::load_schema_files(&["schema.json"])?;
//! let table = RouteTable::from_tree(&tree, &HookRegistry::new())?;
//! let interceptor = Arc::new(middleware::Interceptor::new(Arc::new(table)));
//! let app = axum::Router::new().layer(axum::middleware::from_fn_with_state(
//!     interceptor,
//!     middleware::validation_middleware,
//! ));
//! ```

pub mod compiler;
pub mod config;
pub mod dispatch;
pub mod middleware;
pub mod observability;
pub mod schema;
pub mod validation;

#[cfg(test)]
mod tests;
