//! Object store capabilities used by the upload pipeline.

use std::future::Future;

use bucketdrop_shared::StorageSettings;
use bytes::Bytes;

use super::error::StorageError;

/// Metadata reported for an object that already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Storage key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Content type, if the store reports one.
    pub content_type: Option<String>,
    /// Entity tag, if the store reports one.
    pub etag: Option<String>,
}

/// Result of a successful object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    /// Storage key written.
    pub key: String,
    /// Number of bytes written.
    pub size: u64,
    /// Entity tag, if the store reports one.
    pub etag: Option<String>,
}

/// Opens connections to an object store.
///
/// The upload pipeline asks for a fresh connection on every upload.
pub trait ObjectStoreConnector: Send + Sync {
    /// Connection type produced by this connector.
    type Store: ObjectStore;

    /// Open a connection using the given credentials, endpoint and region.
    ///
    /// Connections always use an encrypted transport.
    fn connect(&self, settings: &StorageSettings) -> Result<Self::Store, StorageError>;
}

/// Bucket and object operations against a connected store.
pub trait ObjectStore: Send + Sync {
    /// Check whether a bucket exists.
    fn bucket_exists(
        &self,
        bucket: &str,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Fetch object metadata.
    ///
    /// Returns [`StorageError::NotFound`] when no object exists under `key`.
    fn stat_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<ObjectMetadata, StorageError>> + Send;

    /// Write `body` under `key`, replacing any existing object.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> impl Future<Output = Result<PutReceipt, StorageError>> + Send;
}
