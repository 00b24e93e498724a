use serde::{Deserialize, Serialize};

/// Runtime interceptor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterceptorConfig {
    /// Largest request body buffered for validation, in bytes. Larger bodies
    /// are reported as unreadable.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    crate::middleware::DEFAULT_MAX_BODY_BYTES
}
