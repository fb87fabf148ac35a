//! S3-compatible object store wrappers.
//!
//! [`ObjectStoreContext`] is the capability surface application code
//! consumes; [`S3ObjectStore`] adapts it onto the AWS S3 SDK, which also
//! speaks to MinIO and other S3-compatible stores.

pub mod context;
pub mod s3;

pub use context::{DownloadResult, ObjectMetadataResult, ObjectStoreContext, ObjectTagsResult};
pub use s3::S3ObjectStore;
