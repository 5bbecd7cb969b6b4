#[cfg(target_os = "linux")]
pub mod linux;

use log::{debug, info};

/// Check if the process is running with elevated privileges
pub fn is_elevated() -> bool {
    #[cfg(target_os = "linux")]
    {
        linux::is_root()
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

/// Get instructions for elevating privileges on the current platform
pub fn get_elevation_instructions() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "Run with sudo: 'sudo diag-collector <identifier>'"
    }
    #[cfg(not(target_os = "linux"))]
    {
        "diag-collector only supports Linux hosts"
    }
}

/// Log what the current privileges allow to collect
pub fn log_privilege_state() {
    #[cfg(target_os = "linux")]
    {
        info!("Running as root");
        if let Some(groups) = linux::supplementary_groups() {
            debug!("Supplementary groups: {:?}", groups);
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        debug!("No privilege details available on this platform");
    }
}
