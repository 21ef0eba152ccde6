//! Core data types for kpm_autoload.

use serde::{Deserialize, Serialize};

/// Auto-load configuration for kernel-patch modules.
///
/// `kpm_paths` is the load order. Duplicates are kept as-is; ordering is
/// the caller's responsibility and the loader consumes the list verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoLoadConfig {
    /// Master switch for the auto-load feature
    pub enabled: bool,

    /// Module paths in load order
    #[serde(rename = "kpmPaths")]
    pub kpm_paths: Vec<String>,
}

impl AutoLoadConfig {
    pub fn new(enabled: bool, kpm_paths: Vec<String>) -> Self {
        AutoLoadConfig { enabled, kpm_paths }
    }

    /// Copy with a different enabled flag.
    pub fn with_enabled(&self, enabled: bool) -> Self {
        AutoLoadConfig {
            enabled,
            kpm_paths: self.kpm_paths.clone(),
        }
    }

    /// Copy with a different path list.
    pub fn with_paths(&self, kpm_paths: Vec<String>) -> Self {
        AutoLoadConfig {
            enabled: self.enabled,
            kpm_paths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kpm_paths.is_empty()
    }
}

/// Snapshot of the badge counters published by the count aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountSnapshot {
    pub superuser_count: usize,
    pub apm_module_count: usize,
    pub kernel_module_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AutoLoadConfig::default();
        assert!(!config.enabled);
        assert!(config.kpm_paths.is_empty());
        assert!(config.is_empty());
    }

    #[test]
    fn test_with_enabled_keeps_paths() {
        let config = AutoLoadConfig::new(false, vec!["/data/a.kpm".to_string()]);
        let enabled = config.with_enabled(true);
        assert!(enabled.enabled);
        assert_eq!(enabled.kpm_paths, config.kpm_paths);
        assert!(!config.enabled, "source config must not change");
    }

    #[test]
    fn test_with_paths_keeps_flag_and_order() {
        let config = AutoLoadConfig::new(true, vec![]);
        let paths = vec![
            "/b.kpm".to_string(),
            "/a.kpm".to_string(),
            "/b.kpm".to_string(),
        ];
        let updated = config.with_paths(paths.clone());
        assert!(updated.enabled);
        assert_eq!(updated.kpm_paths, paths);
    }
}
