//! Request body validation interceptor.
//!
//! Matches an inbound request against the route table, buffers and restores
//! its body, and runs the matched binding's validator. The outcome is
//! reported as [`Metadata`]; the request itself is never rejected here.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use super::metadata::{Metadata, VALIDATION_ERROR_KEY};
use crate::dispatch::RouteTable;

/// Message reported when the request body cannot be read.
pub const BODY_READ_ERROR: &str = "invalid value: unable to parse body";

/// Request header carrying the validation failure message.
pub const VALIDATION_ERROR_HEADER: HeaderName = HeaderName::from_static("atlas-validation-error");

/// Default limit on buffered request bodies (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Runtime interceptor over a shared route table.
#[derive(Debug, Clone)]
pub struct Interceptor {
    table: Arc<RouteTable>,
    max_body_bytes: usize,
}

impl Interceptor {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Validate the request against the first matching route.
    ///
    /// On a match the body is read fully and put back so later consumers can
    /// read it again. A body that cannot be read (or exceeds the size limit)
    /// is replaced with an empty one and reported with [`BODY_READ_ERROR`].
    pub async fn annotate(&self, req: &mut Request) -> Metadata {
        let mut md = Metadata::new();

        let Some(route) = self.table.find(req.method(), req.uri().path()) else {
            return md;
        };
        let pattern_id = route.entry().pattern_id();
        tracing::debug!(pattern_id, path = %req.uri().path(), "Matched validation route");

        let body = std::mem::take(req.body_mut());
        let bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(pattern_id, error = %e, "Failed to read request body");
                md.set(VALIDATION_ERROR_KEY, BODY_READ_ERROR);
                return md;
            }
        };
        *req.body_mut() = Body::from(bytes.clone());

        if let Err(e) = route.validate(&bytes) {
            tracing::debug!(pattern_id, error = %e, "Request body failed validation");
            md.set(VALIDATION_ERROR_KEY, e.to_string());
        }
        md
    }
}

/// Middleware that annotates each request with its validation outcome.
///
/// The [`Metadata`] is inserted into request extensions. When validation
/// failed, the message is also copied into the `Atlas-Validation-Error`
/// request header for handlers that only look at headers. A header of that
/// name sent by the client is always dropped.
pub async fn validation_middleware(
    State(interceptor): State<Arc<Interceptor>>,
    mut req: Request,
    next: Next,
) -> Response {
    let md = interceptor.annotate(&mut req).await;

    req.headers_mut().remove(VALIDATION_ERROR_HEADER);
    if let Some(message) = md.validation_error() {
        match HeaderValue::from_str(message) {
            Ok(value) => {
                req.headers_mut().insert(VALIDATION_ERROR_HEADER, value);
            }
            Err(_) => {
                tracing::warn!("Validation error is not a valid header value, kept in extensions only");
            }
        }
    }

    req.extensions_mut().insert(md);
    next.run(req).await
}
