//! Config validation.

use crate::error::ConfigError;
use crate::models::AutoLoadConfig;

/// Validate a single module path.
///
/// A path must contain something other than whitespace and must not carry
/// a NUL byte, which no filesystem path can hold.
pub fn validate_kpm_path(index: usize, path: &str) -> Result<(), ConfigError> {
    if path.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(format!(
            "Module path {} is empty",
            index
        )));
    }

    if path.contains('\0') {
        return Err(ConfigError::ValidationFailed(format!(
            "Module path {} contains a NUL byte",
            index
        )));
    }

    Ok(())
}

/// Validate an entire auto-load configuration.
///
/// Runs on every decode and again before every save, so text the edit
/// surface accepts is exactly what the store will accept.
pub fn validate_config(config: &AutoLoadConfig) -> Result<(), ConfigError> {
    for (i, path) in config.kpm_paths.iter().enumerate() {
        validate_kpm_path(i, path)?;
    }

    Ok(())
}
