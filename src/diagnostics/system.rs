//! Host readings for `/server-info`.

use std::sync::Mutex;

use sysinfo::System;

use crate::identity::local_hostname;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Point-in-time view of the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSnapshot {
    pub hostname: String,
    pub platform: &'static str,
    pub total_memory_mb: u64,
    pub free_memory_mb: u64,
    /// 1, 5 and 15 minute load averages.
    pub load_average: [f64; 3],
}

/// Reads memory and load from the operating system.
pub struct SystemProbe {
    system: Mutex<System>,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    /// Refresh and read the current host state.
    pub fn snapshot(&self) -> HostSnapshot {
        // A poisoned lock only means a previous reader panicked; the data is
        // refreshed below anyway.
        let mut sys = self.system.lock().unwrap_or_else(|e| e.into_inner());
        sys.refresh_memory();

        let load = System::load_average();
        HostSnapshot {
            hostname: local_hostname(),
            platform: std::env::consts::OS,
            total_memory_mb: to_whole_mb(sys.total_memory()),
            free_memory_mb: to_whole_mb(sys.free_memory()),
            load_average: [load.one, load.five, load.fifteen],
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes to megabytes, rounded to the nearest whole number.
pub fn to_whole_mb(bytes: u64) -> u64 {
    (bytes as f64 / BYTES_PER_MB).round() as u64
}
