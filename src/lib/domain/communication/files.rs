//! File store port

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::mock;

/// File store errors
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The file does not exist
    #[error("file not found: {0}")]
    NotFound(String),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Access to the files attached to messages
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Reads the whole file
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FileStoreError>;

    /// Removes the file
    async fn delete(&self, path: &Path) -> Result<(), FileStoreError>;
}

#[cfg(test)]
mock! {
    pub FileStore {}

    #[async_trait]
    impl FileStore for FileStore {
        async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FileStoreError>;
        async fn delete(&self, path: &Path) -> Result<(), FileStoreError>;
    }
}
