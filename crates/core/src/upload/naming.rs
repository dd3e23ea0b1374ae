//! Randomized object names.

use std::fmt;

use uuid::Uuid;

use super::error::UploadError;

/// Object name of the form `<32 lowercase hex chars>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName(String);

impl ObjectName {
    /// Generate a fresh name keeping the extension of `original_filename`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::ExtensionMissing`] if the filename has no extension
    /// and [`UploadError::InvalidExtension`] if the extension contains a path
    /// separator or a control character.
    pub fn generate(original_filename: &str) -> Result<Self, UploadError> {
        let extension = extension(original_filename)
            .ok_or_else(|| UploadError::extension_missing(original_filename))?;
        if !is_safe_extension(extension) {
            return Err(UploadError::invalid_extension(original_filename));
        }

        Ok(Self::from_parts(Uuid::new_v4(), extension))
    }

    fn from_parts(id: Uuid, extension: &str) -> Self {
        Self(format!("{}.{extension}", id.simple()))
    }

    /// The name as a storage key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the name, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Everything after the first `.` of `filename`, if non-empty.
#[must_use]
pub fn extension(filename: &str) -> Option<&str> {
    filename
        .split_once('.')
        .map(|(_, extension)| extension)
        .filter(|extension| !extension.is_empty())
}

/// Extensions become part of a flat object key: no `/`, `\` or control characters.
fn is_safe_extension(extension: &str) -> bool {
    !extension
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
}
