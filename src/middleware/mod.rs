mod metadata;
mod validation;

pub use metadata::{Metadata, VALIDATION_ERROR_KEY};
pub use validation::{
    BODY_READ_ERROR, DEFAULT_MAX_BODY_BYTES, Interceptor, VALIDATION_ERROR_HEADER,
    validation_middleware,
};
