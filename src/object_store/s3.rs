//! S3 SDK implementation of the object store context.
//!
//! Speaks to MinIO and other S3-compatible stores through an explicit
//! endpoint with path-style addressing and static credentials.
//!
//! Error mapping: bucket-not-found and key-not-found are deliberately
//! collapsed into one `found = false` outcome on every read path.  The
//! SDK models not-found differently per operation (a typed variant on
//! HeadObject/HeadBucket, `NoSuchKey` on GetObject, bare error-code
//! metadata on GetObjectTagging), so classification checks both the
//! typed hooks and the code string.

use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use super::context::{DownloadResult, ObjectMetadataResult, ObjectStoreContext, ObjectTagsResult};
use crate::config::ObjectStoreConfig;
use crate::errors::{Error, Result};

/// Buffer size for streamed downloads.
const DOWNLOAD_BUFFER_SIZE: usize = 128 * 1024;

/// Object store context backed by the AWS S3 SDK.
pub struct S3ObjectStore {
    /// S3 SDK client.
    client: Client,
}

impl S3ObjectStore {
    /// Build a client for the configured endpoint.
    ///
    /// Credentials are always the explicit static pair from the
    /// configuration; the ambient AWS credential chain is never
    /// consulted.
    pub async fn connect(config: &ObjectStoreConfig) -> Self {
        let credentials = aws_sdk_s3::config::Credentials::new(
            &config.access_key,
            &config.secret_key,
            None, // session_token
            None, // expiry
            "infrakit-config",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.use_path_style)
            .build();

        let client = Client::from_conf(s3_config);

        info!(
            "object store client initialized: endpoint={} region={}",
            config.endpoint, config.region
        );

        Self { client }
    }

    /// Serialize a tag mapping into the URL-encoded string PutObject
    /// expects (`k1=v1&k2=v2`).
    fn encode_tagging(tags: &HashMap<String, String>) -> String {
        tags.iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, NON_ALPHANUMERIC),
                    utf8_percent_encode(v, NON_ALPHANUMERIC)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// True when the provider error code denotes a missing bucket or key.
    fn is_not_found_code(code: Option<&str>) -> bool {
        matches!(code, Some("NoSuchBucket" | "NoSuchKey" | "NotFound"))
    }
}

impl ObjectStoreContext for S3ObjectStore {
    fn ensure_bucket_exists(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            debug!("head_bucket: bucket={}", bucket);

            let exists = match self.client.head_bucket().bucket(&bucket).send().await {
                Ok(_) => true,
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.is_not_found() {
                        false
                    } else {
                        return Err(Error::object_store("head_bucket", service_err));
                    }
                }
            };

            if exists {
                info!("bucket {} already exists, skip creating", bucket);
                return Ok(true);
            }

            match self.client.create_bucket().bucket(&bucket).send().await {
                Ok(_) => {
                    info!("bucket {} created successfully", bucket);
                    Ok(true)
                }
                Err(e) => {
                    warn!(
                        "failed to create bucket {}: {}",
                        bucket,
                        e.into_service_error()
                    );
                    Ok(false)
                }
            }
        })
    }

    fn get_object_tags(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectTagsResult>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!("get_object_tagging: bucket={} key={}", bucket, key);

            match self
                .client
                .get_object_tagging()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
            {
                Ok(resp) => {
                    let tags = resp
                        .tag_set()
                        .iter()
                        .map(|tag| (tag.key().to_string(), tag.value().to_string()))
                        .collect();
                    Ok(ObjectTagsResult { found: true, tags })
                }
                Err(e) => {
                    let service_err = e.into_service_error();
                    if Self::is_not_found_code(service_err.meta().code()) {
                        warn!(
                            "tags for {}/{} unavailable: {}",
                            bucket, key, service_err
                        );
                        Ok(ObjectTagsResult::default())
                    } else {
                        Err(Error::object_store("get_object_tagging", service_err))
                    }
                }
            }
        })
    }

    fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        tags: Option<HashMap<String, String>>,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            debug!(
                "put_object: bucket={} key={} bytes={}",
                bucket,
                key,
                data.len()
            );

            let mut request = self
                .client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .content_type(&content_type)
                .content_length(data.len() as i64)
                .body(ByteStream::from(data));

            if let Some(tags) = tags.filter(|t| !t.is_empty()) {
                request = request.tagging(Self::encode_tagging(&tags));
            }

            request
                .send()
                .await
                .map_err(|e| Error::object_store("put_object", e.into_service_error()))?;

            Ok(key)
        })
    }

    fn get_object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectMetadataResult>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!("head_object: bucket={} key={}", bucket, key);

            match self
                .client
                .head_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
            {
                Ok(resp) => Ok(ObjectMetadataResult {
                    found: true,
                    content_type: resp.content_type().map(str::to_string),
                    size: resp.content_length().unwrap_or(0).max(0) as u64,
                }),
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.is_not_found()
                        || Self::is_not_found_code(service_err.meta().code())
                    {
                        warn!(
                            "metadata for {}/{} unavailable: {}",
                            bucket, key, service_err
                        );
                        Ok(ObjectMetadataResult::default())
                    } else {
                        Err(Error::object_store("head_object", service_err))
                    }
                }
            }
        })
    }

    fn write_object_to_stream<'a>(
        &'a self,
        bucket: &str,
        key: &str,
        target: &'a mut (dyn AsyncWrite + Send + Unpin),
    ) -> Pin<Box<dyn Future<Output = Result<DownloadResult>> + Send + 'a>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!("get_object: bucket={} key={}", bucket, key);

            let resp = match self
                .client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.is_no_such_key()
                        || Self::is_not_found_code(service_err.meta().code())
                    {
                        warn!(
                            "download of {}/{} unavailable: {}",
                            bucket, key, service_err
                        );
                        return Ok(DownloadResult { found: false });
                    }
                    return Err(Error::object_store("get_object", service_err));
                }
            };

            copy_body(resp.body, target).await?;

            Ok(DownloadResult { found: true })
        })
    }
}

/// Drain `body` into `target` through a fixed-size buffer, returning the
/// number of bytes written.
async fn copy_body(
    mut body: ByteStream,
    target: &mut (dyn AsyncWrite + Send + Unpin),
) -> Result<u64> {
    let mut writer = BufWriter::with_capacity(DOWNLOAD_BUFFER_SIZE, target);
    let mut written = 0u64;

    while let Some(chunk) = body
        .try_next()
        .await
        .map_err(|e| Error::object_store("get_object body", e))?
    {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    writer.flush().await?;
    Ok(written)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_tagging_single_pair() {
        let mut tags = HashMap::new();
        tags.insert("env".to_string(), "prod".to_string());
        assert_eq!(S3ObjectStore::encode_tagging(&tags), "env=prod");
    }

    #[test]
    fn test_encode_tagging_escapes_reserved_characters() {
        let mut tags = HashMap::new();
        tags.insert("owner".to_string(), "team a&b".to_string());
        assert_eq!(
            S3ObjectStore::encode_tagging(&tags),
            "owner=team%20a%26b"
        );
    }

    #[test]
    fn test_encode_tagging_joins_all_pairs() {
        let mut tags = HashMap::new();
        tags.insert("a".to_string(), "1".to_string());
        tags.insert("b".to_string(), "2".to_string());

        let encoded = S3ObjectStore::encode_tagging(&tags);
        let mut pairs: Vec<&str> = encoded.split('&').collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_not_found_codes_cover_bucket_and_key() {
        assert!(S3ObjectStore::is_not_found_code(Some("NoSuchBucket")));
        assert!(S3ObjectStore::is_not_found_code(Some("NoSuchKey")));
        assert!(S3ObjectStore::is_not_found_code(Some("NotFound")));
        assert!(!S3ObjectStore::is_not_found_code(Some("AccessDenied")));
        assert!(!S3ObjectStore::is_not_found_code(None));
    }

    #[tokio::test]
    async fn test_copy_body_preserves_bytes_below_buffer_size() {
        let payload: Vec<u8> = (0..1024usize).map(|i| (i % 251) as u8).collect();
        let body = ByteStream::from(Bytes::from(payload.clone()));

        let mut sink = std::io::Cursor::new(Vec::new());
        let written = copy_body(body, &mut sink).await.unwrap();

        assert_eq!(written, payload.len() as u64);
        assert_eq!(sink.into_inner(), payload);
    }

    #[tokio::test]
    async fn test_copy_body_preserves_bytes_above_buffer_size() {
        // Crosses the 128 KiB buffer boundary.
        let payload: Vec<u8> = (0..DOWNLOAD_BUFFER_SIZE + 4096)
            .map(|i| (i % 251) as u8)
            .collect();
        let body = ByteStream::from(Bytes::from(payload.clone()));

        let mut sink = std::io::Cursor::new(Vec::new());
        let written = copy_body(body, &mut sink).await.unwrap();

        assert_eq!(written, payload.len() as u64);
        assert_eq!(sink.into_inner(), payload);
    }

    #[tokio::test]
    async fn test_copy_body_handles_empty_object() {
        let body = ByteStream::from(Bytes::new());

        let mut sink = std::io::Cursor::new(Vec::new());
        let written = copy_body(body, &mut sink).await.unwrap();

        assert_eq!(written, 0);
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn test_tags_result_defaults_to_not_found() {
        let result = ObjectTagsResult::default();
        assert!(!result.found);
        assert!(result.tags.is_empty());
    }

    #[test]
    fn test_metadata_result_defaults_to_not_found() {
        let result = ObjectMetadataResult::default();
        assert!(!result.found);
        assert!(result.content_type.is_none());
        assert_eq!(result.size, 0);
    }
}
