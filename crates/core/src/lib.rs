//! Core upload logic for Bucketdrop.
//!
//! This crate contains the upload pipeline and object storage access with
//! ZERO web dependencies.
//!
//! # Modules
//!
//! - `storage` - Object store capabilities and the OpenDAL S3 implementation
//! - `upload` - Randomized naming and the upload pipeline

pub mod storage;
pub mod upload;
