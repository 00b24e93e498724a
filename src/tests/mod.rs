//! Shared fixtures and end-to-end scenarios through the interceptor.

pub mod fixtures;
