//! Application configuration management.

use std::fmt;

use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;

/// Prefix for environment variable overrides, e.g. `BUCKETDROP__STORAGE__BUCKET`.
const ENV_PREFIX: &str = "BUCKETDROP";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage connection settings.
    pub storage: StorageSettings,
    /// Upload handling configuration.
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

/// Upload handling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Re-read the storage settings from the configuration sources on every upload.
    #[serde(default)]
    pub reload_config: bool,
}

impl UploadConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            reload_config: false,
        }
    }
}

fn default_max_file_size() -> u64 {
    UploadConfig::DEFAULT_MAX_FILE_SIZE
}

/// Connection settings for the S3-compatible object store.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct StorageSettings {
    /// Endpoint host (optionally with `https://` scheme).
    pub endpoint: String,
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Region of the bucket.
    pub region: String,
    /// Destination bucket for uploads.
    pub bucket: String,
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl StorageSettings {
    /// Loads only the `storage` section from the configuration sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is missing, incomplete, or has empty values.
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Self = sources()?.get("storage")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings with blank fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::Message`] naming the first blank key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("storage.endpoint", &self.endpoint),
            ("storage.access_key", &self.access_key),
            ("storage.secret_key", &self.secret_key),
            ("storage.region", &self.region),
            ("storage.bucket", &self.bucket),
        ];

        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((key, _)) => Err(ConfigError::Message(format!("{key} must not be empty"))),
            None => Ok(()),
        }
    }
}

/// Supplies storage settings to the upload pipeline at the start of each upload.
pub trait StorageSettingsSource: Send + Sync {
    /// Returns the settings to use for one upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be loaded.
    fn storage_settings(&self) -> Result<StorageSettings, ConfigError>;
}

impl StorageSettingsSource for StorageSettings {
    fn storage_settings(&self) -> Result<StorageSettings, ConfigError> {
        Ok(self.clone())
    }
}

/// Settings source selected by [`UploadConfig::reload_config`].
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// Settings loaded once at start-up.
    Fixed(StorageSettings),
    /// Settings re-read from files, `.env` and environment on every call.
    Reload,
}

impl SettingsSource {
    /// Picks the source for the given configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        if config.upload.reload_config {
            Self::Reload
        } else {
            Self::Fixed(config.storage.clone())
        }
    }
}

impl StorageSettingsSource for SettingsSource {
    fn storage_settings(&self) -> Result<StorageSettings, ConfigError> {
        match self {
            Self::Fixed(settings) => Ok(settings.clone()),
            Self::Reload => StorageSettings::load(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = sources()?.try_deserialize()?;
        config.storage.validate()?;
        Ok(config)
    }
}

fn sources() -> Result<Config, ConfigError> {
    sources_with(dotenv_entries())
}

/// Entries of the nearest `.env` file, read fresh on every call.
fn dotenv_entries() -> Map<String, String> {
    dotenvy::dotenv_iter()
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default()
}

/// Files, then `.env` entries, then the process environment; later sources win.
fn sources_with(dotenv: Map<String, String>) -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE")
        .ok()
        .or_else(|| dotenv.get("RUN_MODE").cloned())
        .unwrap_or_else(|| "development".to_string());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .source(Some(dotenv)),
        )
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
}
