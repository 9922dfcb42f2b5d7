//! S3-compatible object storage provider (requires the `s3` feature).

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream as S3ByteStream;
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use filehub_core::config::storage::S3StorageConfig;
use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{StorageObject, StorageObjectMeta, StorageProvider};

/// S3-compatible storage provider. Keys are used verbatim as object keys.
#[derive(Debug, Clone)]
pub struct S3StorageProvider {
    client: Client,
    bucket: String,
}

impl S3StorageProvider {
    /// Create a new S3 storage provider from configuration.
    ///
    /// Empty credentials fall back to the default AWS credential chain and
    /// an empty endpoint targets AWS itself.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration("storage.s3.bucket must be set"));
        }
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 storage provider"
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "filehub-config",
            ));
        }
        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(config.endpoint.clone());
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }
}

fn s3_error(action: &str, key: &str, err: impl std::error::Error) -> AppError {
    AppError::storage(format!(
        "S3 {action} failed for '{key}': {}",
        DisplayErrorContext(err)
    ))
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()> {
        let len = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(S3ByteStream::from(data))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| s3_error("put", key, e))?;
        debug!(key, bytes = len, "Wrote object");
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<StorageObject> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    AppError::not_found(format!("Object not found: {key}"))
                } else {
                    s3_error("get", key, e)
                }
            })?;

        let size_bytes = output
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .unwrap_or(0);
        let reader = output.body.into_async_read();
        Ok(StorageObject {
            size_bytes,
            stream: Box::pin(ReaderStream::new(reader)),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        // DeleteObject succeeds for missing keys.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error("delete", key, e))?;
        debug!(key, "Deleted object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        match self.head(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind == filehub_core::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn head(&self, key: &str) -> AppResult<StorageObjectMeta> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    AppError::not_found(format!("Object not found: {key}"))
                } else {
                    s3_error("head", key, e)
                }
            })?;

        Ok(StorageObjectMeta {
            key: key.to_string(),
            size_bytes: output
                .content_length()
                .and_then(|len| u64::try_from(len).ok())
                .unwrap_or(0),
            content_type: output.content_type().map(str::to_string),
            last_modified: output
                .last_modified()
                .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        })
    }
}
