//! S3-compatible blob store.
//!
//! Credentials come from the standard AWS provider chain. A custom endpoint
//! with path-style addressing lets the same client talk to MinIO.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::{BlobStore, BlobStoreError};

#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    /// Build a client for `bucket`, optionally pointed at a custom endpoint.
    pub async fn connect(bucket: &str, endpoint: Option<&str>) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: bucket.to_owned(),
        }
    }

    /// Create the bucket unless it already exists.
    pub async fn ensure_bucket(&self) -> Result<(), BlobStoreError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }

        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!(bucket = %self.bucket, "created blob bucket");
                Ok(())
            }
            Err(err) => {
                let err = err.into_service_error();
                if err.is_bucket_already_owned_by_you() {
                    Ok(())
                } else {
                    Err(BlobStoreError::Backend(format!(
                        "failed to create bucket {}: {err}",
                        self.bucket
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_object(&self, key: &str, bytes: Bytes) -> Result<(), BlobStoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| BlobStoreError::Backend(format!("put {key}: {}", e.into_service_error())))?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BlobStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                if e.is_no_such_key() {
                    BlobStoreError::NotFound
                } else {
                    BlobStoreError::Backend(format!("get {key}: {e}"))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BlobStoreError::Backend(format!("read body of {key}: {e}")))?;
        Ok(body.into_bytes())
    }

    async fn remove_object(&self, key: &str) -> Result<(), BlobStoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                BlobStoreError::Backend(format!("delete {key}: {}", e.into_service_error()))
            })?;
        Ok(())
    }
}
