use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

// Type alias for Result using the root error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the tracking core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Achievement API operation failed: {0}")]
    Api(#[from] ApiError),

    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Input validation failed: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(err.to_string())
    }
}
