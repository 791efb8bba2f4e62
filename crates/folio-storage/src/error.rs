use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key {0:?}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object storage {method} {key} failed: {source}")]
    Request {
        method: &'static str,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid storage configuration: {0}")]
    Config(String),
}

impl StorageError {
    pub(crate) fn request(
        method: &'static str,
        key: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Request {
            method,
            key: key.to_string(),
            source: Box::new(source),
        }
    }
}
