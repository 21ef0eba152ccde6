//! JSON codec for the auto-load configuration.
//!
//! `decode` is total: every input, including empty text, binary garbage and
//! pathologically nested arrays, ends in `Ok` or `Err` without panicking.
//! That keeps it cheap enough to run on every edit of the config text.
//!
//! `encode` produces the canonical form used both on disk and to populate
//! the edit surface:
//!
//! ```text
//! {
//!   "enabled": true,
//!   "kpmPaths": [
//!     "/sdcard/a.kpm"
//!   ]
//! }
//! ```

use super::validator::validate_config;
use crate::error::ConfigError;
use crate::models::AutoLoadConfig;
use serde_json::{json, Value};

/// Parse config text.
///
/// The root must be a JSON object. `enabled` and `kpmPaths` are optional;
/// unknown keys are ignored. A present key with the wrong type (including
/// `null`) is an error, as is any path the validator rejects.
pub fn decode(text: &str) -> Result<AutoLoadConfig, ConfigError> {
    let value: Value = serde_json::from_str(text)?;

    if !value.is_object() {
        return Err(ConfigError::ValidationFailed(format!(
            "Configuration must be a JSON object, got {}",
            value_kind(&value)
        )));
    }

    let config: AutoLoadConfig = serde_json::from_value(value)?;
    validate_config(&config)?;

    Ok(config)
}

/// Render the canonical text for a config.
pub fn encode(config: &AutoLoadConfig) -> String {
    let value = json!({
        "enabled": config.enabled,
        "kpmPaths": config.kpm_paths,
    });
    format!("{:#}", value)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
