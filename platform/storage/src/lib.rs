//! Attachment storage.
//!
//! Objects are keyed by their file name, so a name uniquely identifies both the
//! metadata row and the stored bytes.

mod s3;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use s3::{S3Config, S3Storage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {name} failed: {reason}")]
    Upload { name: String, reason: String },
    #[error("delete of {name} failed: {reason}")]
    Delete { name: String, reason: String },
    #[error("listing objects failed: {0}")]
    List(String),
}

#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub url: String,
    pub name: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, file: UploadFile) -> Result<StoredObject, StorageError>;

    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Empties the bucket. Operator tooling only; no request path calls it.
    async fn delete_all(&self) -> Result<usize, StorageError>;
}
