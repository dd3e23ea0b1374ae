//! Upload error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Upload pipeline errors, one per failure point.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The multipart file field is absent or unreadable.
    #[error("file field missing: {reason}")]
    FileFieldMissing {
        /// Why no file could be read.
        reason: String,
    },

    /// The original filename has no extension.
    #[error("file '{filename}' has no extension")]
    ExtensionMissing {
        /// Original filename as sent by the client.
        filename: String,
    },

    /// The extension contains path separators or control characters.
    #[error("file '{filename}' has an extension that cannot be used in an object name")]
    InvalidExtension {
        /// Original filename as sent by the client.
        filename: String,
    },

    /// The file exceeds the configured size limit.
    #[error("file exceeds maximum allowed size of {max} bytes")]
    FileTooLarge {
        /// Maximum allowed size.
        max: u64,
    },

    /// Storage settings could not be loaded.
    #[error("error in loading the config: {0}")]
    ConfigLoadFailed(String),

    /// The object store connection could not be opened.
    #[error("error in initializing the storage client: {0}")]
    StorageClientInitFailed(#[source] StorageError),

    /// The bucket existence check failed.
    #[error("error in checking the bucket: {0}")]
    BucketCheckFailed(#[source] StorageError),

    /// The configured bucket does not exist.
    #[error("bucket {bucket} does not exist")]
    BucketNotFound {
        /// Configured bucket name.
        bucket: String,
    },

    /// Probing for an existing object failed for a reason other than absence.
    #[error("error in getting the object info for {key}: {source}")]
    ObjectProbeFailed {
        /// Generated object name.
        key: String,
        /// Underlying storage error.
        source: StorageError,
    },

    /// Writing the object failed.
    #[error("error in uploading the file {key} to bucket {bucket}: {source}")]
    ObjectUploadFailed {
        /// Target bucket.
        bucket: String,
        /// Generated object name.
        key: String,
        /// Underlying storage error.
        source: StorageError,
    },
}

impl UploadError {
    /// Create a file field missing error.
    #[must_use]
    pub fn file_field_missing(reason: impl Into<String>) -> Self {
        Self::FileFieldMissing {
            reason: reason.into(),
        }
    }

    /// Create an extension missing error.
    #[must_use]
    pub fn extension_missing(filename: impl Into<String>) -> Self {
        Self::ExtensionMissing {
            filename: filename.into(),
        }
    }

    /// Create an invalid extension error.
    #[must_use]
    pub fn invalid_extension(filename: impl Into<String>) -> Self {
        Self::InvalidExtension {
            filename: filename.into(),
        }
    }

    /// Create a file too large error.
    #[must_use]
    pub const fn file_too_large(max: u64) -> Self {
        Self::FileTooLarge { max }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::FileFieldMissing { .. }
            | Self::ExtensionMissing { .. }
            | Self::InvalidExtension { .. } => 400,
            Self::FileTooLarge { .. } => 413,
            Self::ConfigLoadFailed(_)
            | Self::StorageClientInitFailed(_)
            | Self::BucketNotFound { .. } => 500,
            Self::BucketCheckFailed(_)
            | Self::ObjectProbeFailed { .. }
            | Self::ObjectUploadFailed { .. } => 502,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::FileFieldMissing { .. } => "FILE_FIELD_MISSING",
            Self::ExtensionMissing { .. } => "EXTENSION_MISSING",
            Self::InvalidExtension { .. } => "INVALID_EXTENSION",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::ConfigLoadFailed(_) => "CONFIG_LOAD_FAILED",
            Self::StorageClientInitFailed(_) => "STORAGE_CLIENT_INIT_FAILED",
            Self::BucketCheckFailed(_) => "BUCKET_CHECK_FAILED",
            Self::BucketNotFound { .. } => "BUCKET_NOT_FOUND",
            Self::ObjectProbeFailed { .. } => "OBJECT_PROBE_FAILED",
            Self::ObjectUploadFailed { .. } => "OBJECT_UPLOAD_FAILED",
        }
    }

    /// Short human-readable summary of the failure point.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::FileFieldMissing { .. } => "No file uploaded",
            Self::ExtensionMissing { .. } => "File has no extension",
            Self::InvalidExtension { .. } => "File extension is not allowed",
            Self::FileTooLarge { .. } => "File too large",
            Self::ConfigLoadFailed(_) => "Error in loading the config",
            Self::StorageClientInitFailed(_) => "Error in initializing the storage client",
            Self::BucketCheckFailed(_) => "Error in checking the bucket",
            Self::BucketNotFound { .. } => "Bucket does not exist",
            Self::ObjectProbeFailed { .. } => "Error in getting the object info",
            Self::ObjectUploadFailed { .. } => "Error in uploading the file",
        }
    }

    /// Detail for the failure: the underlying error text or the offending value.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::FileFieldMissing { reason } => reason.clone(),
            Self::ExtensionMissing { filename } | Self::InvalidExtension { filename } => {
                filename.clone()
            }
            Self::FileTooLarge { max } => format!("maximum allowed size is {max} bytes"),
            Self::ConfigLoadFailed(msg) => msg.clone(),
            Self::StorageClientInitFailed(e) | Self::BucketCheckFailed(e) => e.to_string(),
            Self::BucketNotFound { bucket } => bucket.clone(),
            Self::ObjectProbeFailed { key, source } => format!("{key}: {source}"),
            Self::ObjectUploadFailed {
                bucket,
                key,
                source,
            } => format!("{bucket}/{key}: {source}"),
        }
    }
}
