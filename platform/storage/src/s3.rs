use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use tracing::{info, warn};

use crate::{ObjectStorage, StorageError, StoredObject, UploadFile};

#[derive(Clone, Debug)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    config: S3Config,
}

impl S3Storage {
    /// Credentials come from the default AWS provider chain.
    pub async fn connect(config: S3Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Self {
            client: Client::new(&sdk_config),
            config,
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.config.bucket, self.config.region, key
        )
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(&self, file: UploadFile) -> Result<StoredObject, StorageError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&file.file_name)
            .body(ByteStream::from(file.bytes));
        if let Some(content_type) = &file.content_type {
            request = request.content_type(content_type);
        }
        request.send().await.map_err(|err| StorageError::Upload {
            name: file.file_name.clone(),
            reason: DisplayErrorContext(&err).to_string(),
        })?;
        info!(key = %file.file_name, bucket = %self.config.bucket, "object uploaded");
        Ok(StoredObject {
            url: self.object_url(&file.file_name),
            name: file.file_name,
        })
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(name)
            .send()
            .await
            .map_err(|err| StorageError::Delete {
                name: name.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;
        info!(key = name, bucket = %self.config.bucket, "object deleted");
        Ok(())
    }

    async fn delete_all(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|err| StorageError::List(DisplayErrorContext(&err).to_string()))?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                match self.delete(key).await {
                    Ok(()) => removed += 1,
                    Err(err) => warn!(error = %err, key, "failed to delete object"),
                }
            }
            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(removed)
    }
}
