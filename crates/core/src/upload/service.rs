//! Upload service implementation.

use bucketdrop_shared::{StorageSettingsSource, UploadConfig};
use tracing::{debug, error, info, warn};

use super::error::UploadError;
use super::naming::ObjectName;
use super::types::{IncomingFile, StoredUpload};
use crate::storage::{ObjectStore, ObjectStoreConnector};

/// Stores uploaded files under randomized names.
///
/// Storage settings are obtained and a store connection is opened on every
/// call; nothing is shared between uploads.
pub struct UploadService<C, S> {
    connector: C,
    settings: S,
    max_file_size: u64,
}

impl<C, S> UploadService<C, S>
where
    C: ObjectStoreConnector,
    S: StorageSettingsSource,
{
    /// Create a new upload service with the default size limit.
    #[must_use]
    pub fn new(connector: C, settings: S) -> Self {
        Self {
            connector,
            settings,
            max_file_size: UploadConfig::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Maximum accepted file size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Store `file` under a freshly generated name.
    ///
    /// # Errors
    ///
    /// Returns the [`UploadError`] of the first step that fails. No step is retried.
    pub async fn upload(&self, file: IncomingFile) -> Result<StoredUpload, UploadError> {
        if file.size() > self.max_file_size {
            warn!(
                filename = %file.filename,
                size = file.size(),
                max_file_size = self.max_file_size,
                "File size limit exceeded"
            );
            return Err(UploadError::file_too_large(self.max_file_size));
        }

        let name = ObjectName::generate(&file.filename).inspect_err(|e| {
            error!(error = %e, "Rejected file name");
        })?;

        let settings = self.settings.storage_settings().map_err(|e| {
            error!(error = %e, "Error in loading the config");
            UploadError::ConfigLoadFailed(e.to_string())
        })?;
        let bucket = settings.bucket.clone();

        let store = self.connector.connect(&settings).map_err(|e| {
            error!(error = %e, endpoint = %settings.endpoint, "Error in initializing the storage client");
            UploadError::StorageClientInitFailed(e)
        })?;

        match store.bucket_exists(&bucket).await {
            Ok(true) => {}
            Ok(false) => {
                error!(bucket = %bucket, "Bucket does not exist");
                return Err(UploadError::BucketNotFound { bucket });
            }
            Err(e) => {
                error!(error = %e, bucket = %bucket, "Error in checking the bucket");
                return Err(UploadError::BucketCheckFailed(e));
            }
        }

        match store.stat_object(&bucket, name.as_str()).await {
            Ok(existing) => {
                warn!(
                    key = %existing.key,
                    size = existing.size,
                    content_type = ?existing.content_type,
                    etag = ?existing.etag,
                    "Object already exists and will be overwritten"
                );
            }
            Err(e) if e.is_not_found() => {
                debug!(key = %name, "No existing object under generated name");
            }
            Err(e) => {
                error!(error = %e, key = %name, "Error in getting the object info");
                return Err(UploadError::ObjectProbeFailed {
                    key: name.into_string(),
                    source: e,
                });
            }
        }

        let receipt = match store
            .put_object(&bucket, name.as_str(), file.body, file.content_type.as_deref())
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(error = %e, bucket = %bucket, key = %name, "Error in uploading the file");
                return Err(UploadError::ObjectUploadFailed {
                    bucket,
                    key: name.into_string(),
                    source: e,
                });
            }
        };

        info!(
            bucket = %bucket,
            key = %name,
            original_filename = %file.filename,
            size = receipt.size,
            "File uploaded"
        );

        Ok(StoredUpload {
            file_name: name,
            bucket,
            size: receipt.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ObjectMetadata, PutReceipt, StorageError};
    use bucketdrop_shared::{ConfigError, StorageSettings};
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy)]
    enum Bucket {
        Exists,
        Missing,
        Fails,
    }

    #[derive(Clone, Copy)]
    enum Probe {
        NotFound,
        Found,
        Fails,
    }

    /// Recorded `put_object` call.
    #[derive(Debug, Clone)]
    struct Put {
        bucket: String,
        key: String,
        size: u64,
        content_type: Option<String>,
    }

    struct MockState {
        bucket: Bucket,
        probe: Probe,
        put_fails: bool,
        connects: usize,
        bucket_checks: usize,
        probes: usize,
        puts: Vec<Put>,
    }

    /// Mock store for testing.
    #[derive(Clone)]
    struct MockStore {
        state: Arc<Mutex<MockState>>,
    }

    impl MockStore {
        fn new(bucket: Bucket, probe: Probe) -> Self {
            Self {
                state: Arc::new(Mutex::new(MockState {
                    bucket,
                    probe,
                    put_fails: false,
                    connects: 0,
                    bucket_checks: 0,
                    probes: 0,
                    puts: Vec::new(),
                })),
            }
        }

        fn failing_put() -> Self {
            let store = Self::new(Bucket::Exists, Probe::NotFound);
            store.state.lock().unwrap().put_fails = true;
            store
        }

        fn calls(&self) -> (usize, usize, usize, usize) {
            let state = self.state.lock().unwrap();
            (state.connects, state.bucket_checks, state.probes, state.puts.len())
        }

        fn puts(&self) -> Vec<Put> {
            self.state.lock().unwrap().puts.clone()
        }
    }

    impl ObjectStore for MockStore {
        async fn bucket_exists(&self, _bucket: &str) -> Result<bool, StorageError> {
            let mut state = self.state.lock().unwrap();
            state.bucket_checks += 1;
            match state.bucket {
                Bucket::Exists => Ok(true),
                Bucket::Missing => Ok(false),
                Bucket::Fails => Err(StorageError::operation("connection refused")),
            }
        }

        async fn stat_object(
            &self,
            _bucket: &str,
            key: &str,
        ) -> Result<ObjectMetadata, StorageError> {
            let mut state = self.state.lock().unwrap();
            state.probes += 1;
            match state.probe {
                Probe::NotFound => Err(StorageError::not_found(key)),
                Probe::Found => Ok(ObjectMetadata {
                    key: key.to_string(),
                    size: 3,
                    content_type: Some("image/png".to_string()),
                    etag: Some("\"abc\"".to_string()),
                }),
                Probe::Fails => Err(StorageError::operation("AccessDenied")),
            }
        }

        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            body: Bytes,
            content_type: Option<&str>,
        ) -> Result<PutReceipt, StorageError> {
            let mut state = self.state.lock().unwrap();
            if state.put_fails {
                return Err(StorageError::operation("SlowDown"));
            }
            let size = body.len() as u64;
            state.puts.push(Put {
                bucket: bucket.to_string(),
                key: key.to_string(),
                size,
                content_type: content_type.map(String::from),
            });
            Ok(PutReceipt {
                key: key.to_string(),
                size,
                etag: None,
            })
        }
    }

    /// Mock connector handing out clones of one store.
    struct MockConnector {
        store: MockStore,
        fails: bool,
    }

    impl ObjectStoreConnector for MockConnector {
        type Store = MockStore;

        fn connect(&self, _settings: &StorageSettings) -> Result<MockStore, StorageError> {
            self.store.state.lock().unwrap().connects += 1;
            if self.fails {
                return Err(StorageError::configuration("endpoint is empty"));
            }
            Ok(self.store.clone())
        }
    }

    /// Settings source that always fails.
    struct BrokenSettings;

    impl StorageSettingsSource for BrokenSettings {
        fn storage_settings(&self) -> Result<StorageSettings, ConfigError> {
            Err(ConfigError::NotFound("storage".to_string()))
        }
    }

    fn settings() -> StorageSettings {
        StorageSettings {
            endpoint: "play.min.io".to_string(),
            access_key: "minio".to_string(),
            secret_key: "minio-secret".to_string(),
            region: "us-east-1".to_string(),
            bucket: "images".to_string(),
        }
    }

    fn service(store: &MockStore) -> UploadService<MockConnector, StorageSettings> {
        let connector = MockConnector {
            store: store.clone(),
            fails: false,
        };
        UploadService::new(connector, settings())
    }

    fn photo() -> IncomingFile {
        IncomingFile::new(
            "photo.png",
            Some("image/png".to_string()),
            Bytes::from_static(b"0123456789"),
        )
    }

    #[tokio::test]
    async fn test_upload_success() {
        let store = MockStore::new(Bucket::Exists, Probe::NotFound);

        let stored = service(&store).upload(photo()).await.expect("should upload");

        assert_eq!(stored.bucket, "images");
        assert_eq!(stored.size, 10);
        assert!(stored.file_name.as_str().ends_with(".png"));

        let puts = store.puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].bucket, "images");
        assert_eq!(puts[0].key, stored.file_name.as_str());
        assert_eq!(puts[0].size, 10);
        assert_eq!(puts[0].content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_upload_reconnects_every_call() {
        let store = MockStore::new(Bucket::Exists, Probe::NotFound);
        let service = service(&store);

        let first = service.upload(photo()).await.unwrap();
        let second = service.upload(photo()).await.unwrap();

        assert_ne!(first.file_name, second.file_name);
        assert_eq!(store.calls(), (2, 2, 2, 2));
    }

    #[tokio::test]
    async fn test_upload_without_extension_touches_nothing() {
        let store = MockStore::new(Bucket::Exists, Probe::NotFound);

        let file = IncomingFile::new("README", None, Bytes::from_static(b"hello"));
        let err = service(&store).upload(file).await.unwrap_err();

        assert!(matches!(err, UploadError::ExtensionMissing { .. }));
        assert_eq!(store.calls(), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_upload_with_traversal_extension_touches_nothing() {
        let store = MockStore::new(Bucket::Exists, Probe::NotFound);

        let file = IncomingFile::new("a.png/../../other", None, Bytes::from_static(b"hello"));
        let err = service(&store).upload(file).await.unwrap_err();

        assert!(matches!(err, UploadError::InvalidExtension { .. }));
        assert_eq!(store.calls(), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let store = MockStore::new(Bucket::Exists, Probe::NotFound);

        let err = service(&store)
            .with_max_file_size(4)
            .upload(photo())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::FileTooLarge { max: 4 }));
        assert_eq!(store.calls(), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_upload_config_load_failed() {
        let store = MockStore::new(Bucket::Exists, Probe::NotFound);
        let connector = MockConnector {
            store: store.clone(),
            fails: false,
        };

        let err = UploadService::new(connector, BrokenSettings)
            .upload(photo())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::ConfigLoadFailed(ref msg) if msg.contains("storage")));
        assert_eq!(store.calls(), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_upload_client_init_failed() {
        let store = MockStore::new(Bucket::Exists, Probe::NotFound);
        let connector = MockConnector {
            store: store.clone(),
            fails: true,
        };

        let err = UploadService::new(connector, settings())
            .upload(photo())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::StorageClientInitFailed(_)));
        assert_eq!(store.calls(), (1, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_upload_bucket_missing_never_puts() {
        let store = MockStore::new(Bucket::Missing, Probe::NotFound);

        let err = service(&store).upload(photo()).await.unwrap_err();

        assert!(matches!(err, UploadError::BucketNotFound { ref bucket } if bucket == "images"));
        assert_eq!(store.calls(), (1, 1, 0, 0));
    }

    #[tokio::test]
    async fn test_upload_bucket_check_failed() {
        let store = MockStore::new(Bucket::Fails, Probe::NotFound);

        let err = service(&store).upload(photo()).await.unwrap_err();

        assert!(matches!(err, UploadError::BucketCheckFailed(_)));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(store.calls(), (1, 1, 0, 0));
    }

    #[tokio::test]
    async fn test_upload_probe_failure_never_puts() {
        let store = MockStore::new(Bucket::Exists, Probe::Fails);

        let err = service(&store).upload(photo()).await.unwrap_err();

        assert!(matches!(err, UploadError::ObjectProbeFailed { .. }));
        assert!(err.to_string().contains("AccessDenied"));
        assert_eq!(store.calls(), (1, 1, 1, 0));
    }

    #[tokio::test]
    async fn test_upload_existing_object_is_overwritten() {
        let store = MockStore::new(Bucket::Exists, Probe::Found);

        let stored = service(&store).upload(photo()).await.expect("should upload");

        assert_eq!(store.calls(), (1, 1, 1, 1));
        assert_eq!(store.puts()[0].key, stored.file_name.as_str());
    }

    #[tokio::test]
    async fn test_upload_put_failure_reports_real_error() {
        let store = MockStore::failing_put();

        let err = service(&store).upload(photo()).await.unwrap_err();

        assert!(matches!(err, UploadError::ObjectUploadFailed { ref bucket, .. } if bucket == "images"));
        assert!(err.to_string().contains("SlowDown"));
    }
}
