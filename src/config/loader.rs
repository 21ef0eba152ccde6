//! Config file loader and atomic persistence.

use super::codec;
use crate::error::ConfigError;
use crate::models::AutoLoadConfig;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Application directory under the platform data dir
pub const APP_DIR_NAME: &str = "kpm_autoload";

/// Config file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "kpm_autoload_config.json";

/// Durable storage for the auto-load configuration.
pub trait ConfigStore: Send + Sync {
    /// Read the persisted config, falling back to the default on any failure.
    fn load(&self) -> AutoLoadConfig;

    /// Persist a config. Either the whole new config is visible afterwards
    /// or the previous file is left exactly as it was.
    fn save(&self, config: &AutoLoadConfig) -> Result<(), ConfigError>;
}

/// Get the application directory: <data_dir>/kpm_autoload
pub fn get_default_config_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine data directory".to_string())
    })?;

    Ok(data_dir.join(APP_DIR_NAME))
}

/// Get the config path: <data_dir>/kpm_autoload/kpm_autoload_config.json
pub fn get_default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(get_default_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Ensure the directory holding `path` exists
pub fn ensure_config_dir_exists(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// File-backed store at a fixed path.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConfigStore { path: path.into() }
    }

    /// Store rooted in a data directory, using the standard file layout.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Store at the platform default location.
    pub fn with_default_path() -> Result<Self, ConfigError> {
        Ok(Self::new(get_default_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict read: surfaces every failure instead of defaulting.
    pub fn read(&self) -> Result<AutoLoadConfig, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ConfigError::FileNotFound(format!(
                    "Configuration file not found at: {}",
                    self.path.display()
                ))
            } else {
                ConfigError::IoError(e)
            }
        })?;

        codec::decode(&content)
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> AutoLoadConfig {
        match self.read() {
            Ok(config) => {
                log::debug!(
                    "[Config] Loaded auto-load config from {} ({} paths, enabled={})",
                    self.path.display(),
                    config.kpm_paths.len(),
                    config.enabled
                );
                config
            }
            Err(ConfigError::FileNotFound(_)) => {
                log::debug!(
                    "[Config] No config at {}, using defaults",
                    self.path.display()
                );
                AutoLoadConfig::default()
            }
            Err(e) => {
                log::warn!(
                    "[Config] Failed to load {}, falling back to defaults: {}",
                    self.path.display(),
                    e
                );
                AutoLoadConfig::default()
            }
        }
    }

    fn save(&self, config: &AutoLoadConfig) -> Result<(), ConfigError> {
        ensure_config_dir_exists(&self.path)?;

        let content = codec::encode(config);
        write_atomic(&self.path, content.as_bytes(), |file, bytes| file.write_all(bytes))?;

        log::info!(
            "[Config] Saved auto-load config to {} ({} paths, enabled={})",
            self.path.display(),
            config.kpm_paths.len(),
            config.enabled
        );
        Ok(())
    }
}

/// Write `content` to `path` through a temp file in the same directory.
///
/// `fill` writes the bytes into the temp file. Until the final rename the
/// target is untouched; on any error the temp file is removed on drop.
fn write_atomic<F>(path: &Path, content: &[u8], fill: F) -> Result<(), ConfigError>
where
    F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    // Same directory keeps the rename on one filesystem.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    fill(temp.as_file_mut(), content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| ConfigError::IoError(e.error))?;
    Ok(())
}
