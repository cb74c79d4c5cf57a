use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}
