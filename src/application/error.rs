use thiserror::Error;

use crate::infra::BackendError;

/// Failures surfaced by the data-access service and media pipeline.
///
/// Write paths surface these to callers; aggregate read paths prefer a warn
/// plus an empty result over propagation. Nothing here is allowed to
/// terminate the process.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("`{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("media decode failed: {message}")]
    Decode { message: String },
    #[error("media encode failed: {message}")]
    Encode { message: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }
}
