//! Object storage access using Apache OpenDAL.
//!
//! The upload pipeline only depends on the [`ObjectStoreConnector`] and
//! [`ObjectStore`] capabilities; [`OpendalConnector`] provides them for any
//! S3-compatible service (MinIO, Cloudflare R2, AWS S3).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      UploadService                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ connector.connect(settings)  │ store.stat_object(bucket, key)   │
//! │ store.bucket_exists(bucket)  │ store.put_object(bucket, key, ..)│
//! ├─────────────────────────────────────────────────────────────────┤
//! │                 Apache OpenDAL (services-s3)                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod service;
mod store;

pub use error::StorageError;
pub use service::{OpendalConnector, OpendalStore};
pub use store::{ObjectMetadata, ObjectStore, ObjectStoreConnector, PutReceipt};
