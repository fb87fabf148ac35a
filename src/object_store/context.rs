//! Object store context contract.
//!
//! Read operations never fail on a missing bucket or key; both
//! conditions collapse into a `found = false` result the caller must
//! branch on.  Write operations propagate provider errors directly.

use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::io::AsyncWrite;

use crate::errors::Result;

/// Outcome of a tag lookup.
#[derive(Debug, Clone, Default)]
pub struct ObjectTagsResult {
    /// Whether the bucket and object both exist.
    pub found: bool,
    /// Tag mapping; empty when `found` is false.
    pub tags: HashMap<String, String>,
}

/// Outcome of a metadata lookup.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadataResult {
    /// Whether the bucket and object both exist.
    pub found: bool,
    /// MIME content type, if the store reports one.
    pub content_type: Option<String>,
    /// Object size in bytes; zero when `found` is false.
    pub size: u64,
}

/// Outcome of a streamed download.
#[derive(Debug, Clone, Copy)]
pub struct DownloadResult {
    /// Whether the bucket and object both exist.
    pub found: bool,
}

/// Thin async contract over an object store.
///
/// Cancellation is expressed by dropping the returned future; no
/// explicit token is threaded through.
pub trait ObjectStoreContext: Send + Sync + 'static {
    /// Check whether `bucket` exists and create it when absent.
    ///
    /// Returns whether the bucket is now known to exist.  A failed
    /// creation attempt is logged and reported as `Ok(false)`; it does
    /// not propagate.
    fn ensure_bucket_exists(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>>;

    /// Retrieve the tag mapping of `key` in `bucket`.
    fn get_object_tags(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectTagsResult>> + Send + '_>>;

    /// Store `data` under `key` in `bucket` with the given content type
    /// and optional tag mapping, returning the stored object's key.
    ///
    /// Unlike the read paths, provider errors propagate uncaught here;
    /// callers must be prepared to handle them directly.
    fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        tags: Option<HashMap<String, String>>,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;

    /// Retrieve content type and size of `key` in `bucket`.
    fn get_object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectMetadataResult>> + Send + '_>>;

    /// Stream the content of `key` in `bucket` into `target`.
    fn write_object_to_stream<'a>(
        &'a self,
        bucket: &str,
        key: &str,
        target: &'a mut (dyn AsyncWrite + Send + Unpin),
    ) -> Pin<Box<dyn Future<Output = Result<DownloadResult>> + Send + 'a>>;
}
