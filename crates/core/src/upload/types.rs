//! Upload domain types.

use bytes::Bytes;

use super::naming::ObjectName;

/// A file received from a client, held for the duration of one upload.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Original filename as declared by the client.
    pub filename: String,
    /// Declared content type (MIME type).
    pub content_type: Option<String>,
    /// File content.
    pub body: Bytes,
}

impl IncomingFile {
    /// Create an incoming file.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            body: body.into(),
        }
    }

    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::try_from(self.body.len()).unwrap_or(u64::MAX)
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Generated object name the file was stored under.
    pub file_name: ObjectName,
    /// Bucket the file was written to.
    pub bucket: String,
    /// Size reported by the store.
    pub size: u64,
}
