//! Configuration module for KPM auto-loading.
//!
//! This module owns the auto-load configuration: which kernel-patch modules
//! are loaded automatically and in what order.
//!
//! # Module Structure
//!
//! - `codec`: JSON decode/encode of `AutoLoadConfig`
//! - `validator`: sanity checks shared by decode and save
//! - `loader`: `ConfigStore` trait and the atomic file-backed store
//! - `draft`: edit-surface state with live validation
//!
//! # Configuration Flow
//!
//! 1. `AutoLoadManager::load_config` reads the store (defaults on failure)
//! 2. The edit surface takes a `ConfigDraft` and validates every edit
//! 3. `AutoLoadManager::save_config` re-validates and persists atomically
//! 4. On success the live config and the `enabled` signal are updated
//!
//! # State Management
//!
//! `AutoLoadManager` is constructed explicitly and shared through `Arc`:
//! - Uses `RwLock<AutoLoadConfig>` for the live value
//! - Publishes `enabled` over a `tokio::sync::watch` channel
//! - Runs store I/O on blocking worker threads

pub mod codec;
pub mod draft;
pub mod loader;
pub mod validator;

pub use codec::{decode, encode};
pub use draft::ConfigDraft;
pub use loader::{ConfigStore, FileConfigStore};

use crate::error::ConfigError;
use crate::models::AutoLoadConfig;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{watch, Mutex};

/// Owner of the live auto-load configuration.
pub struct AutoLoadManager {
    store: Arc<dyn ConfigStore>,
    live: RwLock<AutoLoadConfig>,
    enabled_tx: watch::Sender<bool>,
    io_lock: Mutex<()>,
}

impl AutoLoadManager {
    /// Create a manager over a store. The live config starts as the default
    /// until `load_config` is called.
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        let (enabled_tx, _) = watch::channel(false);
        AutoLoadManager {
            store,
            live: RwLock::new(AutoLoadConfig::default()),
            enabled_tx,
            io_lock: Mutex::new(()),
        }
    }

    /// Create a manager and load the persisted config in one step.
    pub async fn open(store: Arc<dyn ConfigStore>) -> Arc<Self> {
        let manager = Arc::new(Self::new(store));
        manager.load_config().await;
        manager
    }

    /// Re-read the store and replace the live config.
    ///
    /// Never fails: missing or corrupt storage yields the default config.
    /// Holds the I/O lock across the read and the publish, so a slow read
    /// never overwrites a save that finished in between.
    pub async fn load_config(&self) -> AutoLoadConfig {
        let _guard = self.io_lock.lock().await;

        let store = Arc::clone(&self.store);
        let config = match tokio::task::spawn_blocking(move || store.load()).await {
            Ok(config) => config,
            Err(e) => {
                log::error!("[AutoLoad] Config load task failed, using defaults: {}", e);
                AutoLoadConfig::default()
            }
        };

        self.publish(config.clone());
        config
    }

    /// Canonical text of the live config, for pre-populating the editor.
    pub fn config_json(&self) -> String {
        encode(&self.read_live())
    }

    /// Validate text without touching the live config.
    pub fn parse_config_json(&self, text: &str) -> Result<AutoLoadConfig, ConfigError> {
        decode(text)
    }

    /// Validate and persist a config, then make it live.
    ///
    /// On any error the live config and the `enabled` signal are unchanged.
    pub async fn save_config(&self, config: AutoLoadConfig) -> Result<(), ConfigError> {
        if let Err(e) = validator::validate_config(&config) {
            log::warn!("[AutoLoad] Rejected config before save: {}", e);
            return Err(e);
        }

        let _guard = self.io_lock.lock().await;

        let store = Arc::clone(&self.store);
        let to_save = config.clone();
        let result = tokio::task::spawn_blocking(move || store.save(&to_save))
            .await
            .map_err(|e| ConfigError::TaskFailed(e.to_string()))
            .and_then(|r| r);

        match result {
            Ok(()) => {
                self.publish(config);
                Ok(())
            }
            Err(e) => {
                log::error!("[AutoLoad] Failed to save config: {}", e);
                Err(e)
            }
        }
    }

    /// Clone of the live config.
    pub fn current(&self) -> AutoLoadConfig {
        self.read_live()
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled_tx.borrow()
    }

    /// Receiver for the `enabled` signal. Always holds the latest value.
    pub fn subscribe_enabled(&self) -> watch::Receiver<bool> {
        self.enabled_tx.subscribe()
    }

    fn read_live(&self) -> AutoLoadConfig {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, config: AutoLoadConfig) {
        let enabled = config.enabled;
        *self.live.write().unwrap_or_else(PoisonError::into_inner) = config;
        self.enabled_tx.send_replace(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_manager(temp_dir: &TempDir) -> AutoLoadManager {
        AutoLoadManager::new(Arc::new(FileConfigStore::in_dir(temp_dir.path())))
    }

    #[tokio::test]
    async fn test_fresh_install_loads_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);

        let config = manager.load_config().await;
        assert_eq!(config, AutoLoadConfig::default());
        assert!(!manager.is_enabled());
        assert!(!*manager.subscribe_enabled().borrow());
    }

    #[tokio::test]
    async fn test_save_publishes_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);
        let mut rx = manager.subscribe_enabled();

        let config = AutoLoadConfig::new(true, vec!["/sdcard/a.kpm".to_string()]);
        manager.save_config(config.clone()).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert_eq!(manager.current(), config);
    }

    #[tokio::test]
    async fn test_config_json_reflects_live_state() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);
        assert_eq!(manager.config_json(), encode(&AutoLoadConfig::default()));

        let config = AutoLoadConfig::new(false, vec!["/b.kpm".to_string()]);
        manager.save_config(config.clone()).await.unwrap();
        assert_eq!(manager.config_json(), encode(&config));
    }

    #[tokio::test]
    async fn test_parse_does_not_mutate() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);

        let parsed = manager
            .parse_config_json(r#"{"enabled":true,"kpmPaths":["/x.kpm"]}"#)
            .unwrap();
        assert!(parsed.enabled);
        assert_eq!(manager.current(), AutoLoadConfig::default());
        assert!(!manager.is_enabled());
        assert!(manager.parse_config_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_invalid_config_is_not_committed() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);
        let valid = AutoLoadConfig::new(false, vec!["/a.kpm".to_string()]);
        manager.save_config(valid.clone()).await.unwrap();

        let rx = manager.subscribe_enabled();
        let invalid = AutoLoadConfig::new(true, vec!["".to_string()]);
        let result = manager.save_config(invalid).await;

        assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
        assert_eq!(manager.current(), valid);
        assert!(!manager.is_enabled());
        assert!(!rx.has_changed().unwrap());
        assert_eq!(manager.load_config().await, valid);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let manager = file_manager(&temp_dir);
        let config = AutoLoadConfig::new(true, vec!["/a.kpm".to_string()]);
        manager.save_config(config.clone()).await.unwrap();

        assert_eq!(manager.load_config().await, config);
        assert_eq!(manager.load_config().await, config);
        assert!(manager.is_enabled());
    }

    #[tokio::test]
    async fn test_open_loads_persisted_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileConfigStore::in_dir(temp_dir.path()));
        let config = AutoLoadConfig::new(true, vec!["/a.kpm".to_string()]);
        store.save(&config).unwrap();

        let manager = AutoLoadManager::open(store).await;
        assert_eq!(manager.current(), config);
        assert!(manager.is_enabled());
    }
}
