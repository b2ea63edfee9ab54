//! Local filesystem store

use std::{io::ErrorKind, path::Path};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::communication::{FileStore, FileStoreError};

/// Reads and removes files on the local disk
#[derive(Debug, Default, Clone)]
pub struct LocalFileStore;

impl From<std::io::Error> for FileStoreError {
    fn from(err: std::io::Error) -> Self {
        FileStoreError::UnknownError(err.into())
    }
}

fn not_found(path: &Path, err: std::io::Error) -> FileStoreError {
    match err.kind() {
        ErrorKind::NotFound => FileStoreError::NotFound(path.display().to_string()),
        _ => err.into(),
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FileStoreError> {
        fs::read(path).await.map_err(|e| not_found(path, e))
    }

    async fn delete(&self, path: &Path) -> Result<(), FileStoreError> {
        fs::remove_file(path).await.map_err(|e| not_found(path, e))
    }
}
