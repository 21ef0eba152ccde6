/// Native capability interface
///
/// The privileged native layer reports who holds elevated privileges and
/// which modules are loaded. Its binding, IPC and privilege mechanism live
/// outside this crate; everything here talks to it through `NativeBridge`.

use crate::error::NativeError;

/// Trait for queries against the native privilege/module subsystem
pub trait NativeBridge: Send + Sync {
    /// UIDs currently granted elevated privileges.
    ///
    /// The list includes one reserved entry for the managing application.
    fn privileged_uids(&self) -> Result<Vec<u32>, NativeError>;

    /// Installed APM modules as a JSON array.
    fn list_modules(&self) -> Result<String, NativeError>;

    /// Number of kernel-patch modules currently loaded.
    fn kernel_module_count(&self) -> Result<i64, NativeError>;
}

/// Bridge used when no native layer is reachable; every call fails.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBridge;

impl NativeBridge for UnavailableBridge {
    fn privileged_uids(&self) -> Result<Vec<u32>, NativeError> {
        Err(NativeError::Unavailable("privileged_uids".to_string()))
    }

    fn list_modules(&self) -> Result<String, NativeError> {
        Err(NativeError::Unavailable("list_modules".to_string()))
    }

    fn kernel_module_count(&self) -> Result<i64, NativeError> {
        Err(NativeError::Unavailable("kernel_module_count".to_string()))
    }
}
