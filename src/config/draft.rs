//! Edit-surface state for the auto-load configuration.
//!
//! A draft is a private copy: the toggle and the raw text change freely and
//! nothing reaches the manager until `commit`. The text is re-validated on
//! every change so the caller can disable saving and show an inline error
//! as soon as it stops parsing.

use super::{codec, AutoLoadManager};
use crate::error::ConfigError;
use crate::models::AutoLoadConfig;

#[derive(Debug)]
pub struct ConfigDraft {
    enabled: bool,
    text: String,
    parsed: Result<AutoLoadConfig, String>,
}

impl ConfigDraft {
    /// Start a draft from the manager's live config.
    pub fn from_manager(manager: &AutoLoadManager) -> Self {
        Self::from_config(&manager.current())
    }

    pub fn from_config(config: &AutoLoadConfig) -> Self {
        ConfigDraft {
            enabled: config.enabled,
            text: codec::encode(config),
            parsed: Ok(config.clone()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text and validate it immediately.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.parsed = codec::decode(&self.text).map_err(|e| e.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_ok()
    }

    /// Inline error for the current text, if any.
    pub fn error(&self) -> Option<&str> {
        self.parsed.as_ref().err().map(String::as_str)
    }

    pub fn can_save(&self) -> bool {
        self.is_valid()
    }

    /// Merge the toggle with the paths parsed from the text.
    ///
    /// The toggle wins: an `enabled` key inside the text is ignored.
    pub fn build_config(&self) -> Result<AutoLoadConfig, ConfigError> {
        let parsed = codec::decode(&self.text)?;
        Ok(parsed.with_enabled(self.enabled))
    }

    /// Save the merged config through the manager.
    pub async fn commit(&self, manager: &AutoLoadManager) -> Result<AutoLoadConfig, ConfigError> {
        let config = self.build_config()?;
        manager.save_config(config.clone()).await?;
        Ok(config)
    }
}
