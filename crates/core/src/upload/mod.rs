//! Upload pipeline: name generation, bucket and object checks, and the write.
//!
//! Each upload runs these steps in order and stops at the first failure:
//!
//! 1. Enforce the size limit
//! 2. Generate `<32 hex chars>.<extension>` from the original filename,
//!    refusing extensions with path separators or control characters
//! 3. Load storage settings
//! 4. Connect to the object store
//! 5. Require the bucket to exist (never created automatically)
//! 6. Probe the generated name (an existing object is logged, not an error)
//! 7. Write the object

mod error;
mod naming;
mod service;
mod types;

pub use error::UploadError;
pub use naming::{ObjectName, extension};
pub use service::UploadService;
pub use types::{IncomingFile, StoredUpload};
