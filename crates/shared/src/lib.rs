//! Shared configuration for Bucketdrop.
//!
//! This crate provides the types every other crate reads its settings from:
//! - Server and upload limits
//! - Object storage connection settings
//! - Settings sources used by the upload pipeline

pub mod config;

pub use crate::config::{
    AppConfig, ServerConfig, SettingsSource, StorageSettings, StorageSettingsSource, UploadConfig,
};
pub use ::config::ConfigError;
