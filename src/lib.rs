//! kpm_autoload
//!
//! Persisted configuration engine for kernel-patch module (KPM) auto-loading,
//! plus the badge counters a management front end shows next to it.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Core data structures
//! - **config**: Codec, validation, atomic storage and the `AutoLoadManager`
//! - **native**: Capability trait for the privileged native layer
//! - **counts**: Badge counters refreshed from the native layer
//! - **log_collector**: `log` backend writing to stderr and disk

pub mod error;
pub mod models;

pub mod config;

pub mod native;

pub mod counts;

pub mod log_collector;

// Re-export the log crate for macro usage
pub use log;

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{AppError, ConfigError, NativeError};

pub use models::{AutoLoadConfig, CountSnapshot};

pub use config::{AutoLoadManager, ConfigDraft, ConfigStore, FileConfigStore};

pub use native::NativeBridge;

pub use counts::{CountAggregator, ManagerExclusion};

pub use log_collector::{init_logging, LogCollector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
