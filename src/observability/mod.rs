//! Observability: structured logging setup for the CLI and embedding services.

mod tracing_init;

pub use tracing_init::*;
