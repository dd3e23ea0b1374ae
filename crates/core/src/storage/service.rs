//! S3-compatible object store implementation using Apache OpenDAL.

use bucketdrop_shared::StorageSettings;
use bytes::Bytes;
use futures::TryStreamExt;
use opendal::{ErrorKind, Operator, services};

use super::error::StorageError;
use super::store::{ObjectMetadata, ObjectStore, ObjectStoreConnector, PutReceipt};

const HTTPS_SCHEME: &str = "https://";
const HTTP_SCHEME: &str = "http://";
/// S3 error code for a bucket that does not exist.
const NO_SUCH_BUCKET: &str = "NoSuchBucket";

/// Connector that opens OpenDAL S3 operators.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpendalConnector;

impl ObjectStoreConnector for OpendalConnector {
    type Store = OpendalStore;

    fn connect(&self, settings: &StorageSettings) -> Result<OpendalStore, StorageError> {
        OpendalStore::new(settings)
    }
}

/// Connection to an S3-compatible store.
///
/// OpenDAL operators are bound to a single bucket, so the operator for the
/// configured bucket is built up front and others are built on demand.
pub struct OpendalStore {
    settings: StorageSettings,
    endpoint: String,
    operator: Operator,
}

impl OpendalStore {
    /// Create a store from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not encrypted or the operator cannot be built.
    pub fn new(settings: &StorageSettings) -> Result<Self, StorageError> {
        let endpoint = secure_endpoint(&settings.endpoint)?;
        Self::with_endpoint(settings, endpoint)
    }

    fn with_endpoint(settings: &StorageSettings, endpoint: String) -> Result<Self, StorageError> {
        let operator = create_operator(&endpoint, settings, &settings.bucket)?;

        Ok(Self {
            settings: settings.clone(),
            endpoint,
            operator,
        })
    }

    /// Endpoint URL the store talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn operator_for(&self, bucket: &str) -> Result<Operator, StorageError> {
        if bucket == self.settings.bucket {
            Ok(self.operator.clone())
        } else {
            create_operator(&self.endpoint, &self.settings, bucket)
        }
    }
}

impl ObjectStore for OpendalStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        let operator = self.operator_for(bucket)?;

        let first = match operator.lister_with("/").limit(1).await {
            Ok(mut lister) => lister.try_next().await,
            Err(e) => Err(e),
        };

        match first {
            Ok(_) => Ok(true),
            Err(e) if is_missing_bucket(&e) => Ok(false),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StorageError> {
        let meta = self
            .operator_for(bucket)?
            .stat(key)
            .await
            .map_err(StorageError::from)?;

        Ok(ObjectMetadata {
            key: key.to_string(),
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
            etag: meta.etag().map(String::from),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<PutReceipt, StorageError> {
        let operator = self.operator_for(bucket)?;
        let sent = u64::try_from(body.len()).unwrap_or(u64::MAX);

        let written = match content_type {
            Some(content_type) => {
                operator
                    .write_with(key, body)
                    .content_type(content_type)
                    .await
            }
            None => operator.write(key, body).await,
        };
        let meta = written.map_err(StorageError::from)?;

        // Some S3 writers report no length for single-part uploads.
        let size = match meta.content_length() {
            0 => sent,
            written => written,
        };

        Ok(PutReceipt {
            key: key.to_string(),
            size,
            etag: meta.etag().map(String::from),
        })
    }
}

/// S3 answers a listing of an absent bucket with 404 `NoSuchBucket`, which
/// OpenDAL reports as `ConfigInvalid` rather than `NotFound`.
fn is_missing_bucket(err: &opendal::Error) -> bool {
    match err.kind() {
        ErrorKind::NotFound => true,
        ErrorKind::ConfigInvalid => err.to_string().contains(NO_SUCH_BUCKET),
        _ => false,
    }
}

/// Normalize an endpoint so that it always uses TLS.
///
/// Bare hosts get an `https://` scheme; plain `http://` endpoints are rejected.
fn secure_endpoint(endpoint: &str) -> Result<String, StorageError> {
    let endpoint = endpoint.trim().trim_end_matches('/');

    if endpoint.is_empty() {
        return Err(StorageError::configuration("endpoint is empty"));
    }
    if endpoint.starts_with(HTTP_SCHEME) {
        return Err(StorageError::configuration(format!(
            "endpoint {endpoint} does not use an encrypted transport"
        )));
    }
    if endpoint.starts_with(HTTPS_SCHEME) {
        return Ok(endpoint.to_string());
    }

    Ok(format!("{HTTPS_SCHEME}{endpoint}"))
}

/// Create OpenDAL operator for one bucket.
fn create_operator(
    endpoint: &str,
    settings: &StorageSettings,
    bucket: &str,
) -> Result<Operator, StorageError> {
    let builder = services::S3::default()
        .endpoint(endpoint)
        .bucket(bucket)
        .access_key_id(&settings.access_key)
        .secret_access_key(&settings.secret_key)
        .region(&settings.region)
        .disable_config_load();

    Ok(Operator::new(builder)
        .map_err(|e| StorageError::configuration(e.to_string()))?
        .finish())
}
